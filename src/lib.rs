pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{StoreConfig, TomlConfig};

pub use adapters::{ApiClient, FileCartStorage, LogNotifier, Notifier, WebhookNotifier};
pub use core::{cart::CartEngine, orders::OrderEngine, refresh::RefreshTask, session::Session};
pub use utils::error::{Result, StoreError};

/// Session wired to the HTTP service and a JSON cart file.
pub type StoreSession = Session<ApiClient, FileCartStorage, Notifier>;
