// Server module entry point
// Listener creation, connection handling and graceful shutdown

pub mod connection;
pub mod listener;
pub mod serve;
pub mod signal;

// Re-export commonly used items
pub use listener::create_reusable_listener;
pub use serve::start_server_loop;
pub use signal::{start_signal_handler, Shutdown};
