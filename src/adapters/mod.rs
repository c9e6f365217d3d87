// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod notify;
pub mod storage;

pub use http::ApiClient;
pub use notify::{LogNotifier, Notifier, WebhookNotifier};
pub use storage::FileCartStorage;
