//! Request handler module
//!
//! Responsible for request routing dispatch and turning lookup outcomes into
//! JSON responses.

mod error;
mod path;
pub mod router;

// Re-export main entry point
pub use router::{handle_request, Router};
