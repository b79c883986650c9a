//! Configuration for the FieldHub API service.

use std::time::Duration;

use fieldhub_billing_core::LedgerConfig;

/// FieldHub API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Subscription ledger configuration
    pub ledger: LedgerConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Payment webhook
        let webhook_secret = std::env::var("PAYMENT_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("PAYMENT_WEBHOOK_SECRET"))?;

        let webhook_tolerance_secs: u64 = std::env::var("PAYMENT_WEBHOOK_TOLERANCE_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PAYMENT_WEBHOOK_TOLERANCE_SECS"))?;

        // Default plan codes seeded on startup
        let default_person_plan_code = std::env::var("DEFAULT_PERSON_PLAN_CODE")
            .unwrap_or_else(|_| "default_user".to_string());
        let default_organization_plan_code = std::env::var("DEFAULT_ORGANIZATION_PLAN_CODE")
            .unwrap_or_else(|_| "default_org".to_string());

        // Request timeout
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let ledger = LedgerConfig::new(&webhook_secret)
            .with_webhook_tolerance(Duration::from_secs(webhook_tolerance_secs))
            .with_default_plan_codes(&default_person_plan_code, &default_organization_plan_code);

        Ok(Self {
            http_port,
            database_url,
            ledger,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
