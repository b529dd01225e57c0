// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub upstream: UpstreamConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            show_headers: false,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Idle seconds before a keep-alive connection is closed (0 disables keep-alive)
    pub keep_alive_timeout: u64,
    /// Seconds allowed to receive request headers
    pub read_timeout: u64,
    /// Seconds allowed for a lookup before answering with an internal error
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_shutdown_timeout() -> u64 {
    10
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Mount prefix removed from every request path before routing
    #[serde(default)]
    pub base_path: String,
    /// Pretty-print JSON response bodies
    #[serde(default = "default_pretty_json")]
    pub pretty_json: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_pretty_json() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            pretty_json: default_pretty_json(),
        }
    }
}

/// Upstream lookup sources
///
/// `dni_url` and `ruc_url` are URL templates; `{id}` is replaced with the
/// validated number before each request.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpstreamConfig {
    pub dni_url: String,
    pub ruc_url: String,
    /// Whole-request timeout in seconds
    pub timeout: u64,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    pub user_agent: String,
    /// Extra headers sent with every upstream request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            dni_url: "http://127.0.0.1:9000/dni/{id}".to_string(),
            ruc_url: "http://127.0.0.1:9000/ruc/{id}".to_string(),
            timeout: 10,
            connect_timeout: 5,
            user_agent: concat!("peru-consult/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
        }
    }
}
