//! HTTP protocol layer module
//!
//! Protocol helpers shared by the static handlers: byte ranges, conditional
//! requests, MIME detection, body types and fixed-status responses.

pub mod body;
pub mod conditional;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use range::parse_range_header;
pub use response::{
    build_301_response, build_404_response, build_405_response, build_412_response,
    build_416_response, build_error_response, build_options_response, build_paused_response,
};
