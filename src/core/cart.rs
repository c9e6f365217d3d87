use crate::core::{Cart, CartItem, CartStorage, Product, RecordId, Result};
use crate::utils::error::StoreError;

/// Returns the cart with `quantity` more of `product`, or `None` when the
/// product is not purchasable.
pub fn add_item(cart: &Cart, product: &Product, quantity: u32) -> Result<Option<Cart>> {
    if !product.active {
        return Ok(None);
    }
    if quantity == 0 {
        return Err(StoreError::validation("quantity must be at least 1"));
    }

    let mut items = cart.items().to_vec();
    match items
        .iter_mut()
        .find(|item| item.item_id() == &product.item_id)
    {
        Some(existing) => {
            existing.cart_quantity = existing
                .cart_quantity
                .checked_add(quantity)
                .ok_or_else(|| StoreError::validation("cart quantity is too large"))?;
        }
        None => items.push(CartItem::new(product.clone(), quantity)),
    }

    Cart::from_items(items).map(Some)
}

/// Returns the cart without `item_id`, or `None` when it is not in the cart.
pub fn remove_item(cart: &Cart, item_id: &RecordId) -> Result<Option<Cart>> {
    if cart.get(item_id).is_none() {
        return Ok(None);
    }
    let items = cart
        .items()
        .iter()
        .filter(|item| item.item_id() != item_id)
        .cloned()
        .collect();
    Cart::from_items(items).map(Some)
}

/// Folds repeated ids into one line and drops empty lines. Returns the lines
/// and whether anything changed, or `None` if a merged quantity overflows.
fn normalize_items(items: Vec<CartItem>) -> Option<(Vec<CartItem>, bool)> {
    let original_len = items.len();
    let mut merged: Vec<CartItem> = Vec::with_capacity(original_len);
    let mut changed = false;

    for item in items {
        if item.cart_quantity == 0 {
            changed = true;
            continue;
        }
        match merged.iter_mut().find(|m| m.item_id() == item.item_id()) {
            Some(existing) => {
                existing.cart_quantity = existing.cart_quantity.checked_add(item.cart_quantity)?;
                changed = true;
            }
            None => merged.push(item),
        }
    }

    Some((merged, changed))
}

/// Owns the session cart and keeps its durable mirror in step.
///
/// Every mutation is written to storage before it becomes visible, so a
/// failed write leaves the in-memory cart as it was.
pub struct CartEngine<S: CartStorage> {
    storage: S,
    cart: Cart,
}

impl<S: CartStorage> CartEngine<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            cart: Cart::new(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Loads the durable snapshot into an empty cart. Returns whether a
    /// snapshot was loaded.
    pub fn restore(&mut self) -> Result<bool> {
        if !self.cart.is_empty() {
            return Ok(false);
        }

        let snapshot = match self.storage.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::debug!("No stored cart found");
                return Ok(false);
            }
            Err(StoreError::SerializationError(e)) => {
                tracing::warn!("Stored cart is unreadable, starting empty: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let stored_quantity = snapshot.total_quantity;
        let stored_sub_total = snapshot.sub_total;

        let Some((items, adjusted)) = normalize_items(snapshot.items) else {
            tracing::warn!("Stored cart quantities overflow, starting empty");
            return Ok(false);
        };
        if adjusted {
            tracing::warn!("Stored cart had repeated or empty lines; merged them");
        }

        let cart = match Cart::from_items(items) {
            Ok(cart) => cart,
            Err(e) => {
                tracing::warn!("Stored cart is unusable, starting empty: {}", e);
                return Ok(false);
            }
        };

        if cart.total_quantity() != stored_quantity || cart.sub_total() != stored_sub_total {
            tracing::warn!(
                "Stored cart totals ({} items, {}) disagree with its items ({} items, {}); using recomputed totals",
                stored_quantity,
                stored_sub_total,
                cart.total_quantity(),
                cart.sub_total()
            );
        }

        tracing::info!(
            "🛒 Restored cart with {} line(s), subtotal {}",
            cart.items().len(),
            cart.sub_total()
        );
        self.cart = cart;
        Ok(true)
    }

    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) -> Result<&Cart> {
        match add_item(&self.cart, product, quantity)? {
            Some(next) => {
                tracing::debug!("Adding {} x {} to cart", quantity, product.item_id);
                self.commit(next)
            }
            None => {
                tracing::debug!("Ignoring inactive product {}", product.item_id);
                Ok(&self.cart)
            }
        }
    }

    pub fn remove_from_cart(&mut self, item_id: &RecordId) -> Result<&Cart> {
        match remove_item(&self.cart, item_id)? {
            Some(next) => {
                tracing::debug!("Removing {} from cart", item_id);
                self.commit(next)
            }
            None => Ok(&self.cart),
        }
    }

    /// Empties the cart in memory first, so the session never keeps a
    /// purchased cart even when the storage slot cannot be removed.
    pub fn clear_cart(&mut self) -> Result<()> {
        self.cart = Cart::new();
        self.storage.clear()
    }

    fn commit(&mut self, next: Cart) -> Result<&Cart> {
        self.storage.save(&next.snapshot())?;
        self.cart = next;
        Ok(&self.cart)
    }
}
