// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, UpstreamConfig};

/// Placeholder replaced with the looked-up number in upstream URL templates
pub const ID_PLACEHOLDER: &str = "{id}";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = UpstreamConfig::default();
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("CONSULT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.base_path", "")?
            .set_default("http.pretty_json", true)?
            .set_default("upstream.dni_url", defaults.dni_url)?
            .set_default("upstream.ruc_url", defaults.ruc_url)?
            .set_default("upstream.timeout", 10)?
            .set_default("upstream.connect_timeout", 5)?
            .set_default("upstream.user_agent", defaults.user_agent)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.upstream
            .validate()
            .map_err(config::ConfigError::Message)?;
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

impl UpstreamConfig {
    /// Check that both templates carry `{id}` and expand to http(s) URLs
    pub fn validate(&self) -> Result<(), String> {
        validate_template("upstream.dni_url", &self.dni_url)?;
        validate_template("upstream.ruc_url", &self.ruc_url)
    }
}

fn validate_template(field: &str, template: &str) -> Result<(), String> {
    if !template.contains(ID_PLACEHOLDER) {
        return Err(format!("{field}: template must contain {ID_PLACEHOLDER}"));
    }

    let sample = template.replace(ID_PLACEHOLDER, "0");
    let url = reqwest::Url::parse(&sample).map_err(|e| format!("{field}: invalid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("{field}: unsupported URL scheme: {scheme}")),
    }
}
