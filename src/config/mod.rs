#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CartCommand, CliConfig, Command, CredentialArgs, LoginArgs, OrdersCommand};
pub use toml_config::TomlConfig;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;
use toml_config::{DEFAULT_CART_PATH, DEFAULT_REFRESH_INTERVAL_SECONDS, DEFAULT_TIMEOUT_SECONDS};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Settings after the TOML file and command-line overrides are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub base_url: String,
    pub cart_path: String,
    pub timeout_seconds: u64,
    pub refresh_interval_seconds: u64,
    pub webhook_url: Option<String>,
    pub log_format: String,
    pub verbose: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cart_path: DEFAULT_CART_PATH.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS,
            webhook_url: None,
            log_format: "compact".to_string(),
            verbose: false,
        }
    }
}

impl StoreConfig {
    pub fn from_toml(config: &TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config.service.base_url.clone(),
            cart_path: config
                .storage_path()
                .map(str::to_string)
                .unwrap_or(defaults.cart_path),
            timeout_seconds: config.timeout_seconds(),
            refresh_interval_seconds: config.refresh_interval_seconds(),
            webhook_url: config.webhook_url().map(str::to_string),
            log_format: config
                .log_format()
                .map(str::to_string)
                .unwrap_or(defaults.log_format),
            verbose: config
                .log_level()
                .map(|level| level.eq_ignore_ascii_case("debug") || level.eq_ignore_ascii_case("trace"))
                .unwrap_or(false),
        }
    }
}

impl ConfigProvider for StoreConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cart_path(&self) -> &str {
        &self.cart_path
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("service.base_url", &self.base_url)?;
        validation::validate_path("cart.storage_path", &self.cart_path)?;
        validation::validate_positive_number("service.timeout_seconds", self.timeout_seconds, 1)?;
        validation::validate_range(
            "orders.refresh_interval_seconds",
            self.refresh_interval_seconds,
            1,
            3600,
        )?;
        if let Some(url) = &self.webhook_url {
            validation::validate_url("notifications.webhook_url", url)?;
        }
        Ok(())
    }
}
