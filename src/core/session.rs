//! Session-scoped state: one shopper or staff member, one cart slot, one
//! order replica. Nothing here is global; a session is opened at startup and
//! closed at the end.

use crate::core::cart::CartEngine;
use crate::core::catalog::CatalogMirror;
use crate::core::checkout;
use crate::core::orders::{OrderEngine, ReplicaSnapshot};
use crate::core::refresh::RefreshTask;
use crate::core::{
    Backend, Cart, CartStorage, CheckoutForm, Credentials, NewProduct, NotificationSender, Order,
    OrderStatus, Product, RecordId, Result, User,
};
use crate::utils::error::StoreError;
use std::sync::Arc;
use std::time::Duration;

pub struct Session<B, S, N>
where
    B: Backend + 'static,
    S: CartStorage,
    N: NotificationSender + 'static,
{
    backend: Arc<B>,
    catalog: CatalogMirror,
    cart: CartEngine<S>,
    orders: Arc<OrderEngine<B, N>>,
    user: Option<User>,
    refresh: Option<RefreshTask>,
}

impl<B, S, N> Session<B, S, N>
where
    B: Backend + 'static,
    S: CartStorage,
    N: NotificationSender + 'static,
{
    /// Creates the session and restores the stored cart.
    pub fn open(backend: Arc<B>, storage: S, notifier: Arc<N>) -> Result<Self> {
        let mut cart = CartEngine::new(storage);
        cart.restore()?;
        let orders = Arc::new(OrderEngine::new(Arc::clone(&backend), notifier));

        Ok(Self {
            backend,
            catalog: CatalogMirror::new(),
            cart,
            orders,
            user: None,
            refresh: None,
        })
    }

    // ----- current user -----

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(StoreError::Unauthenticated)
    }

    /// Asks the service who the session cookie belongs to.
    pub async fn check_user(&mut self) -> Result<Option<&User>> {
        self.user = self.backend.current_user().await?;
        Ok(self.user.as_ref())
    }

    pub async fn register(&mut self, credentials: &Credentials) -> Result<&User> {
        let user = self.backend.register(credentials).await?;
        self.accept_user(user, &credentials.username)
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<&User> {
        let user = self.backend.login(credentials).await?;
        self.accept_user(user, &credentials.username)
    }

    fn accept_user(&mut self, user: Option<User>, username: &str) -> Result<&User> {
        match user {
            Some(user) => {
                tracing::info!("🔑 Signed in as {}", user.display_name());
                Ok(self.user.insert(user))
            }
            None => {
                tracing::warn!("Service did not accept credentials for {}", username);
                Err(StoreError::Unauthenticated)
            }
        }
    }

    /// Ends the service session. Order watching stops with it.
    pub async fn logout(&mut self) -> Result<bool> {
        let success = self.backend.logout().await?;
        if success {
            self.user = None;
            self.stop_watching().await;
        }
        Ok(success)
    }

    // ----- catalog -----

    pub fn catalog(&self) -> &CatalogMirror {
        &self.catalog
    }

    pub async fn sync_catalog(&mut self) -> Result<usize> {
        self.catalog.sync(self.backend.as_ref()).await
    }

    pub async fn create_product(&mut self, product: &NewProduct) -> Result<Product> {
        self.require_user()?;
        let created = self.backend.create_product(product).await?;
        self.catalog.upsert(created.clone());
        Ok(created)
    }

    pub async fn edit_product(
        &mut self,
        item_id: &RecordId,
        changes: &serde_json::Value,
    ) -> Result<Product> {
        self.require_user()?;
        let updated = self.backend.edit_product(item_id, changes).await?;
        self.catalog.upsert(updated.clone());
        Ok(updated)
    }

    pub async fn delete_product(&mut self, item_id: &RecordId) -> Result<Product> {
        self.require_user()?;
        let deleted = self.backend.delete_product(item_id).await?;
        self.catalog.remove(&deleted.item_id);
        Ok(deleted)
    }

    // ----- cart -----

    pub fn cart(&self) -> &Cart {
        self.cart.cart()
    }

    /// Adds a catalog product by id; sync the catalog first.
    pub fn add_to_cart(&mut self, item_id: &RecordId, quantity: u32) -> Result<&Cart> {
        if !self.catalog.is_synced() {
            return Err(StoreError::validation(
                "the product catalog has not been loaded yet",
            ));
        }
        let product = self
            .catalog
            .find(item_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product", item_id))?;
        self.cart.add_to_cart(&product, quantity)
    }

    pub fn remove_from_cart(&mut self, item_id: &RecordId) -> Result<&Cart> {
        self.cart.remove_from_cart(item_id)
    }

    pub fn clear_cart(&mut self) -> Result<()> {
        self.cart.clear_cart()
    }

    pub async fn checkout(&mut self, form: &CheckoutForm) -> Result<Order> {
        checkout::checkout(form, &mut self.cart, self.orders.as_ref()).await
    }

    // ----- orders (staff only) -----

    pub fn order_engine(&self) -> Arc<OrderEngine<B, N>> {
        Arc::clone(&self.orders)
    }

    pub async fn orders(&self) -> Result<ReplicaSnapshot> {
        self.require_user()?;
        Ok(self.orders.list_orders().await)
    }

    pub async fn refresh_orders(&self) -> Result<bool> {
        self.require_user()?;
        self.orders.refresh().await
    }

    pub async fn set_order_status(
        &self,
        order_id: &RecordId,
        new_status: OrderStatus,
    ) -> Result<Order> {
        self.require_user()?;
        self.orders.set_status(order_id, new_status).await
    }

    /// Refreshes now and then every `period` until [`Self::stop_watching`].
    /// Watching again replaces the running task.
    pub async fn watch_orders(&mut self, period: Duration) -> Result<()> {
        self.require_user()?;
        if period.is_zero() {
            return Err(StoreError::validation("refresh period must be greater than zero"));
        }
        self.stop_watching().await;
        self.orders.refresh().await?;
        self.refresh = Some(RefreshTask::spawn(Arc::clone(&self.orders), period)?);
        tracing::info!("👀 Watching orders every {:?}", period);
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.refresh
            .as_ref()
            .map(RefreshTask::is_running)
            .unwrap_or(false)
    }

    pub async fn stop_watching(&mut self) {
        if let Some(task) = self.refresh.take() {
            task.stop().await;
        }
    }

    pub async fn close(mut self) {
        self.stop_watching().await;
        tracing::debug!("Session closed");
    }
}
