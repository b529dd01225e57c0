//! HTTP protocol layer module
//!
//! JSON envelope builders and the uniform response decoration step,
//! decoupled from routing and lookups.

pub mod cors;
pub mod response;

// Re-export commonly used items
pub use cors::decorate;
pub use response::{
    build_error_response, build_health_response, build_preflight_response,
    build_success_response,
};
