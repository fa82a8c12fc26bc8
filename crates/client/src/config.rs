//! Client configuration

use std::time::Duration;

use clap::Args;
use storefront::money::FormatConfig;
use thiserror::Error;

/// Configuration errors that clap cannot catch.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The currency code is not an ISO 4217 currency.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Backend API settings.
#[derive(Debug, Clone, Args)]
pub struct ApiConfig {
    /// Base URL of the storefront API
    #[arg(
        long,
        env = "STOREFRONT_API_BASE_URL",
        default_value = "http://localhost:8080/api/v1"
    )]
    pub api_base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "STOREFRONT_API_TIMEOUT_SECONDS", default_value_t = 30u64)]
    pub api_timeout_seconds: u64,

    /// Bearer token sent with every request
    #[arg(long, env = "STOREFRONT_API_TOKEN")]
    pub api_token: Option<String>,
}

impl ApiConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_seconds)
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storefront client configuration.
#[derive(Debug, Clone, Args)]
pub struct ClientConfig {
    /// Backend API settings.
    #[command(flatten)]
    pub api: ApiConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// ISO 4217 currency used to format amounts
    #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "EUR")]
    pub currency: String,
}

impl ClientConfig {
    /// Formatting configuration for the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not recognised.
    pub fn format_config(&self) -> Result<FormatConfig, ConfigError> {
        FormatConfig::from_code(&self.currency)
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }
}
