use crate::domain::model::{
    CartSnapshot, CompletionNotice, Credentials, NewProduct, Order, OrderRequest, OrderStatus,
    Product, RecordId, User,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Single-slot durable storage for the session's cart.
///
/// Calls are synchronous: cart mutations never suspend.
pub trait CartStorage: Send + Sync {
    fn load(&self) -> Result<Option<CartSnapshot>>;
    fn save(&self, snapshot: &CartSnapshot) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>>;
}

/// Catalog editing passthrough for authenticated staff.
#[async_trait]
pub trait CatalogAdmin: Send + Sync {
    async fn create_product(&self, product: &NewProduct) -> Result<Product>;
    async fn edit_product(&self, item_id: &RecordId, changes: &serde_json::Value) -> Result<Product>;
    async fn delete_product(&self, item_id: &RecordId) -> Result<Product>;
}

/// The authoritative order collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list_orders(&self) -> Result<Vec<Order>>;
    async fn create_order(&self, request: &OrderRequest) -> Result<Order>;
    async fn update_status(&self, order_id: &RecordId, new_status: OrderStatus) -> Result<Order>;
}

#[async_trait]
pub trait AccountService: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>>;
    async fn register(&self, credentials: &Credentials) -> Result<Option<User>>;
    async fn login(&self, credentials: &Credentials) -> Result<Option<User>>;
    /// Returns whether the service ended the session.
    async fn logout(&self) -> Result<bool>;
}

/// Fulfillment-notification hook, fired when an order reaches `Completed`.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn order_completed(&self, notice: &CompletionNotice) -> Result<()>;
}

/// Everything a session needs from the backing service.
pub trait Backend: CatalogSource + CatalogAdmin + OrderStore + AccountService {}

impl<T> Backend for T where T: CatalogSource + CatalogAdmin + OrderStore + AccountService {}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn cart_path(&self) -> &str;
    fn refresh_interval(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn webhook_url(&self) -> Option<&str>;
}
