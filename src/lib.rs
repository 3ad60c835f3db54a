//! Static file server with a start-up pause gate and per-file header sidecars.
//!
//! Directories are mounted under URL prefixes; every served file may carry a
//! `<file>.header` sidecar whose headers are merged into the response.

pub mod config;
pub mod error;
pub mod gate;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod sidecar;
