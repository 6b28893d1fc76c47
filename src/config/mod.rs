// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

use crate::dispatch::{DispatchOptions, DEFAULT_OVERRIDE_HEADER};

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Config file read when none is given on the command line, without extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Prefix of environment overrides, e.g. `RESTGATE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "RESTGATE";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; environment variables override it and defaults
    /// fill the rest.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let builder = with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        builder.build()?.try_deserialize()
    }

    /// Parse a TOML document on top of the defaults, without environment overrides
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        with_defaults(config::Config::builder())?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            override_header: self.http.override_header.clone(),
        }
    }

    /// Path prefix without its trailing slash
    pub fn path_prefix(&self) -> &str {
        self.http.path_prefix.trim_end_matches('/')
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("http.path_prefix", "")?
        .set_default("http.override_header", DEFAULT_OVERRIDE_HEADER)?
        .set_default("http.max_body_size", 10_485_760)? // 10MB
        .set_default("http.server_name", "restgate")?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.show_headers", false)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("performance.backlog", 128)
}
