//! Configuration management

use anyhow::Result;
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    #[serde(default)]
    pub tls_cert: String,
    #[serde(default)]
    pub tls_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite file holding projects and user assignments
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Base of the table-data REST API (e.g. "https://bigquery.googleapis.com/bigquery/v2")
    pub api_base_url: String,
    /// Endpoint issuing bearer tokens for the warehouse API
    pub auth_token_url: String,
    /// Assumed token lifetime when the token endpoint does not report `expires_in`
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
    /// Tokens are treated as expired this long before their real expiry
    #[serde(default = "default_token_safety_margin_secs")]
    pub token_safety_margin_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_token_lifetime_secs() -> u64 {
    3600
}

fn default_token_safety_margin_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10_000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsConfig {
    /// Offset from UTC used for hour-of-day buckets and calendar-day boundaries
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" for human readable output, "gcp" for structured Cloud Logging
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";

        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("CHATLABS").separator("__"));

        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.http_port == 0 {
            anyhow::bail!("Invalid http_port: 0 is not allowed");
        }
        if self.server.host.is_empty() {
            anyhow::bail!("Server host cannot be empty");
        }

        // Validate database config
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        // Validate warehouse config
        if self.warehouse.api_base_url.is_empty() {
            anyhow::bail!("Warehouse api_base_url cannot be empty");
        }
        if self.warehouse.auth_token_url.is_empty() {
            anyhow::bail!("Warehouse auth_token_url cannot be empty");
        }
        if self.warehouse.page_size == 0 {
            anyhow::bail!("Warehouse page_size must be at least 1");
        }

        // Validate TLS (both or neither must be set)
        let has_cert = !self.server.tls_cert.is_empty();
        let has_key = !self.server.tls_key.is_empty();
        if has_cert != has_key {
            anyhow::bail!(
                "TLS configuration incomplete: both tls_cert and tls_key must be set, or neither"
            );
        }

        if self.analytics.utc_offset_minutes.abs() > 14 * 60 {
            anyhow::bail!(
                "Invalid utc_offset_minutes {}: must be within +/-840",
                self.analytics.utc_offset_minutes
            );
        }

        // Validate logging
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid logging level '{}'. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }
        let valid_formats = ["text", "gcp"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Invalid logging format '{}'. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            );
        }

        Ok(())
    }

    pub fn tls_enabled(&self) -> bool {
        !self.server.tls_cert.is_empty() && !self.server.tls_key.is_empty()
    }

    /// The offset dashboards are rendered in
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.analytics.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

impl WarehouseConfig {
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime_secs)
    }

    pub fn token_safety_margin(&self) -> Duration {
        Duration::from_secs(self.token_safety_margin_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
