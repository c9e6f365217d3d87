//! In-process fakes for the ports, shared by the unit tests.

use crate::core::{
    CartSnapshot, CartStorage, CompletionNotice, NotificationSender, Order, OrderRequest,
    OrderStatus, OrderStore, RecordId, Result,
};
use crate::utils::error::StoreError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Default)]
struct StorageSlot {
    snapshot: Option<CartSnapshot>,
    writes: usize,
    fail_writes: bool,
}

#[derive(Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<StorageSlot>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.slot.lock().unwrap().writes
    }

    pub fn fail_writes(&self, fail: bool) {
        self.slot.lock().unwrap().fail_writes = fail;
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<CartSnapshot>> {
        Ok(self.slot.lock().unwrap().snapshot.clone())
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<()> {
        let mut slot = self.slot.lock().unwrap();
        if slot.fail_writes {
            return Err(StoreError::StorageError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only cart slot",
            )));
        }
        slot.snapshot = Some(snapshot.clone());
        slot.writes += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.slot.lock().unwrap().snapshot = None;
        Ok(())
    }
}

/// Order store backed by a vector, with knobs for failure and timing.
#[derive(Default)]
pub struct ScriptedOrderStore {
    orders: Mutex<Vec<Order>>,
    next_id: AtomicI64,
    list_calls: AtomicUsize,
    fail_create: Mutex<bool>,
    status_override: Mutex<Option<OrderStatus>>,
    list_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedOrderStore {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        let store = Self::default();
        store.next_id.store(orders.len() as i64 + 100, Ordering::SeqCst);
        *store.orders.lock().unwrap() = orders;
        store
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fail_create(&self, fail: bool) {
        *self.fail_create.lock().unwrap() = fail;
    }

    /// The server answers every status update with `status` instead.
    pub fn override_status(&self, status: OrderStatus) {
        *self.status_override.lock().unwrap() = Some(status);
    }

    pub fn set_server_status(&self, order_id: &RecordId, status: OrderStatus) {
        let mut orders = self.orders.lock().unwrap();
        if let Some(order) = orders.iter_mut().find(|o| &o.order_id == order_id) {
            order.status = status;
        }
    }

    /// The next `list_orders` call snapshots the collection immediately but
    /// does not answer until the returned sender fires.
    pub fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.list_gate.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl OrderStore for ScriptedOrderStore {
    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.orders.lock().unwrap().clone();
        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(snapshot)
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<Order> {
        if *self.fail_create.lock().unwrap() {
            return Err(StoreError::ServiceError {
                status: 500,
                message: "database unavailable".to_string(),
            });
        }
        let order = Order {
            order_id: RecordId::from(self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: request.name.clone(),
            contact: request.contact.clone(),
            total: request.total,
            items: request.items.clone(),
            status: OrderStatus::Placed,
        };
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn update_status(&self, order_id: &RecordId, new_status: OrderStatus) -> Result<Order> {
        let status = (*self.status_override.lock().unwrap()).unwrap_or(new_status);
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| &o.order_id == order_id)
            .ok_or_else(|| StoreError::not_found("order", order_id))?;
        order.status = status;
        Ok(order.clone())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<CompletionNotice>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn notices(&self) -> Vec<CompletionNotice> {
        self.notices.lock().unwrap().clone()
    }

    /// Lets spawned notification tasks run, then returns what was recorded.
    pub async fn settle(&self) -> Vec<CompletionNotice> {
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.notices()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn order_completed(&self, notice: &CompletionNotice) -> Result<()> {
        self.notices.lock().unwrap().push(notice.clone());
        if self.fail {
            return Err(StoreError::NotificationError {
                message: "sms gateway down".to_string(),
            });
        }
        Ok(())
    }
}

pub fn order(id: i64, status: OrderStatus) -> Order {
    Order {
        order_id: RecordId::from(id),
        name: format!("Customer {}", id),
        contact: format!("555-{:04}", id),
        total: rust_decimal::Decimal::from(id * 10),
        items: Vec::new(),
        status,
    }
}
