//! Logging setup for the credential service binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the embedding application.

use crate::config::parse_env;
use crate::error::TokenError;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "credential-service".to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Create config with custom service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Create config with custom log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Read `LOG_LEVEL` and `LOG_JSON` from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOG_JSON` is not a boolean.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(level) = env::var("LOG_LEVEL") {
            config.log_level = level;
        }
        config.json_output = parse_env("LOG_JSON", false)?;
        Ok(config)
    }
}

/// Install the global tracing subscriber.
///
/// Should be called once at application startup.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TokenError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    result.map_err(|e| TokenError::internal(format!("Tracing init failed: {}", e)))?;
    tracing::info!(service = %config.service_name, "Tracing initialized");
    Ok(())
}
