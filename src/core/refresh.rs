use crate::core::orders::OrderEngine;
use crate::core::{NotificationSender, OrderStore, Result};
use crate::utils::error::StoreError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Periodic order refresh owned by whoever started it.
///
/// The first tick fires one `period` after spawning; callers refresh once
/// themselves at startup. Dropping the task cancels it.
pub struct RefreshTask {
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// Fails on a zero `period`, which the ticker cannot run with.
    pub fn spawn<O, N>(engine: Arc<OrderEngine<O, N>>, period: Duration) -> Result<Self>
    where
        O: OrderStore + 'static,
        N: NotificationSender + 'static,
    {
        if period.is_zero() {
            return Err(StoreError::validation("refresh period must be greater than zero"));
        }

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            tracing::debug!("Order refresh started (every {:?})", period);
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = engine.refresh().await {
                            tracing::warn!("Order refresh failed: {}", e);
                        }
                    }
                }
            }

            tracing::debug!("Order refresh stopped");
        });

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancels the loop and waits for an in-flight refresh to finish.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Order refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
