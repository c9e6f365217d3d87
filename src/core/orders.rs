use crate::core::{
    CompletionNotice, NotificationSender, Order, OrderRequest, OrderStatus, OrderStore, RecordId,
    Result,
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Read-only view of the replica handed to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaSnapshot {
    pub orders: Vec<Order>,
    /// Bumped every time the replica changes.
    pub version: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Replica {
    orders: Vec<Order>,
    /// Highest ticket absorbed so far.
    ticket: u64,
    version: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Replica {
    fn snapshot(&self) -> ReplicaSnapshot {
        ReplicaSnapshot {
            orders: self.orders.clone(),
            version: self.version,
            refreshed_at: self.refreshed_at,
        }
    }
}

/// Local replica of the remote order collection.
///
/// Every remote call takes a ticket when it is issued. A full refresh only
/// lands if its ticket is newer than everything the replica has absorbed;
/// local merges always land and take a fresh ticket, which marks any
/// refresh still in flight as stale.
pub struct OrderEngine<O, N> {
    store: Arc<O>,
    notifier: Arc<N>,
    replica: RwLock<Replica>,
    tickets: AtomicU64,
    changes: watch::Sender<u64>,
}

impl<O, N> OrderEngine<O, N>
where
    O: OrderStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(store: Arc<O>, notifier: Arc<N>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            store,
            notifier,
            replica: RwLock::new(Replica::default()),
            tickets: AtomicU64::new(0),
            changes,
        }
    }

    fn issue_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, replica: &mut Replica) {
        replica.version += 1;
        self.changes.send_replace(replica.version);
    }

    /// Receives the replica version after every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub async fn list_orders(&self) -> ReplicaSnapshot {
        self.replica.read().await.snapshot()
    }

    pub async fn order(&self, order_id: &RecordId) -> Option<Order> {
        self.replica
            .read()
            .await
            .orders
            .iter()
            .find(|o| &o.order_id == order_id)
            .cloned()
    }

    /// Replaces the replica with the store's collection. Returns `false`
    /// when the response was stale and discarded.
    pub async fn refresh(&self) -> Result<bool> {
        let ticket = self.issue_ticket();
        let orders = self.store.list_orders().await?;

        let mut replica = self.replica.write().await;
        if ticket <= replica.ticket {
            tracing::debug!(
                "Discarding stale order refresh (ticket {} <= {})",
                ticket,
                replica.ticket
            );
            return Ok(false);
        }

        tracing::debug!("Refreshed {} orders", orders.len());
        replica.orders = orders;
        replica.ticket = ticket;
        replica.refreshed_at = Some(Utc::now());
        self.publish(&mut replica);
        Ok(true)
    }

    /// Submits a new order. The replica is left alone; see [`Self::append_order`].
    pub async fn create_order(&self, request: &OrderRequest) -> Result<Order> {
        tracing::debug!(
            "Submitting order for {} ({} lines, total {})",
            request.name,
            request.items.len(),
            request.total
        );
        let order = self.store.create_order(request).await?;
        tracing::info!("📦 Order {} placed for {}", order.order_id, order.name);
        Ok(order)
    }

    /// Reflects an order locally before the next refresh picks it up.
    pub async fn append_order(&self, order: Order) {
        let mut replica = self.replica.write().await;
        match replica
            .orders
            .iter_mut()
            .find(|o| o.order_id == order.order_id)
        {
            Some(existing) => *existing = order,
            None => replica.orders.push(order),
        }
        replica.ticket = self.issue_ticket();
        self.publish(&mut replica);
    }

    /// Asks the store to move an order to `new_status` and merges the
    /// store's answer into the replica.
    ///
    /// The hook fires once when the answer moves the order into
    /// `Completed`; its outcome never affects the returned order.
    pub async fn set_status(&self, order_id: &RecordId, new_status: OrderStatus) -> Result<Order> {
        let updated = self.store.update_status(order_id, new_status).await?;
        if updated.status != new_status {
            tracing::info!(
                "Store answered status {} for order {} (requested {})",
                updated.status,
                updated.order_id,
                new_status
            );
        }

        let previous = {
            let mut replica = self.replica.write().await;
            let previous = match replica
                .orders
                .iter_mut()
                .find(|o| o.order_id == updated.order_id)
            {
                Some(existing) => {
                    let previous = existing.status;
                    *existing = updated.clone();
                    Some(previous)
                }
                None => None,
            };
            match previous {
                Some(_) => {
                    replica.ticket = self.issue_ticket();
                    self.publish(&mut replica);
                }
                None => tracing::debug!(
                    "Order {} not in replica; leaving it for the next refresh",
                    updated.order_id
                ),
            }
            previous
        };

        if updated.status == OrderStatus::Completed && previous != Some(OrderStatus::Completed) {
            self.dispatch_completion(&updated);
        }

        Ok(updated)
    }

    fn dispatch_completion(&self, order: &Order) {
        let notifier = Arc::clone(&self.notifier);
        let notice = CompletionNotice::from(order);
        tokio::spawn(async move {
            match notifier.order_completed(&notice).await {
                Ok(()) => tracing::info!(
                    "✉️ Completed order {} for {} {}",
                    notice.order_id,
                    notice.name,
                    notice.contact
                ),
                Err(e) => tracing::warn!(
                    "Completion notice for order {} failed: {}",
                    notice.order_id,
                    e
                ),
            }
        });
    }
}
