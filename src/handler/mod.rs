//! Request handler module
//!
//! Request routing dispatch, static mount resolution and conditional file
//! serving.

pub mod content;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use content::SidecarSource;
pub use router::{handle_request, RequestContext};
