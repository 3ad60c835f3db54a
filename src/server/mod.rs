// Server module entry point
// Listener setup, connection serving, readiness probing and signal handling

pub mod connection;
pub mod idle;
pub mod listener;
pub mod readiness;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::create_reusable_listener;
pub use readiness::{wait_until_ready, ReadinessError};
pub use server_loop::run;
pub use signal::{start_signal_handler, SignalHandler};
