use crate::core::{CompletionNotice, ConfigProvider, NotificationSender, Result};
use crate::utils::error::StoreError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Writes the completion to the log instead of contacting the customer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn order_completed(&self, notice: &CompletionNotice) -> Result<()> {
        tracing::info!(
            "completed order {} for {} {}",
            notice.order_id,
            notice.name,
            notice.contact
        );
        Ok(())
    }
}

/// Posts `{order_id, name, contact}` to an HTTP endpoint, e.g. an SMS relay.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| StoreError::InvalidConfigValueError {
            field: "notifications.webhook_url".to_string(),
            value: url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationSender for WebhookNotifier {
    async fn order_completed(&self, notice: &CompletionNotice) -> Result<()> {
        tracing::debug!("Posting completion of order {} to {}", notice.order_id, self.url);
        let response = self
            .client
            .post(self.url.clone())
            .json(notice)
            .send()
            .await
            .map_err(|e| StoreError::NotificationError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StoreError::NotificationError {
                message: format!("webhook answered {}", response.status()),
            });
        }
        Ok(())
    }
}

/// The sender picked from configuration.
#[derive(Debug, Clone)]
pub enum Notifier {
    Log(LogNotifier),
    Webhook(WebhookNotifier),
}

impl Notifier {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        match config.webhook_url() {
            Some(url) => Ok(Notifier::Webhook(WebhookNotifier::new(
                url,
                config.request_timeout(),
            )?)),
            None => Ok(Notifier::Log(LogNotifier)),
        }
    }
}

#[async_trait]
impl NotificationSender for Notifier {
    async fn order_completed(&self, notice: &CompletionNotice) -> Result<()> {
        match self {
            Notifier::Log(sender) => sender.order_completed(notice).await,
            Notifier::Webhook(sender) => sender.order_completed(notice).await,
        }
    }
}
