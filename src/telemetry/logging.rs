//! Logging configuration and initialization.
//!
//! Supports the RUST_LOG environment variable, the `[logging]` section of
//! config.toml, and pretty / compact / json output.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Logging configuration from config.toml.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format: pretty, compact, json
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

/// Initializes the logging system.
///
/// RUST_LOG wins over the config file; without either, logs at info level
/// in pretty format. Calling it again is a no-op.
pub fn init_logging(config: Option<&LogConfig>) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if let Some(cfg) = config {
        EnvFilter::new(parse_level(&cfg.level).as_str())
    } else {
        EnvFilter::new("info")
    };

    let format = config.map(|c| c.format.as_str()).unwrap_or("pretty");

    let registry = tracing_subscriber::registry().with(env_filter);
    let _ = match format {
        "json" => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        ),
        "compact" => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().compact()),
        ),
        _ => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer()),
        ),
    };
}

/// Parses a log level string into a Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}
