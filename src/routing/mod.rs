//! Routing module
//!
//! Maps request paths to static mounts and single-file routes.

mod matcher;
mod table;

pub use matcher::{match_route, RouteMatch};
pub use table::{RouteEntry, RoutePattern, RouteTable, RouteTarget};
