use crate::utils::error::{Result as StoreResult, StoreError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Identifier assigned by the backing service.
///
/// The service may hand out integers or strings; two ids are equal when their
/// textual forms are equal, so `7` and `"7"` name the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            RecordId::Number(n) => Cow::Owned(n.to_string()),
            RecordId::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.as_key() == other.as_key()
    }
}

impl Eq for RecordId {}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only canonical integers; "007" stays text so it can match a string id.
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Ok(RecordId::Number(n)),
            _ => Ok(RecordId::Text(s.to_string())),
        }
    }
}

/// A catalog entry. Display attributes the core does not interpret are kept
/// in `attributes` so they round-trip through the cart and orders untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub item_id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Product {
    pub fn new(item_id: impl Into<RecordId>, name: &str, price: Decimal, active: bool) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.to_string(),
            price,
            active,
            attributes: Attributes::new(),
        }
    }
}

/// Fields for `POST /items/new`; the service assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub active: bool,
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteProductRequest {
    pub item_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "cartQuantity")]
    pub cart_quantity: u32,
}

impl CartItem {
    pub fn new(product: Product, cart_quantity: u32) -> Self {
        Self {
            product,
            cart_quantity,
        }
    }

    pub fn item_id(&self) -> &RecordId {
        &self.product.item_id
    }

    /// `price × cartQuantity`, or `None` when it does not fit a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.product
            .price
            .checked_mul(Decimal::from(self.cart_quantity))
    }
}

/// The durable form of a cart: `{items, totalQuantity, subTotal}`.
///
/// Stored totals are advisory; [`Cart::try_from`] recomputes them from `items`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_quantity: u64,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub sub_total: Decimal,
}

/// Items plus totals that are always derived from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CartSnapshot")]
pub struct Cart {
    items: Vec<CartItem>,
    total_quantity: u64,
    #[serde(with = "rust_decimal::serde::float")]
    sub_total: Decimal,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the totals from `items`. Fails when the subtotal overflows.
    pub fn from_items(items: Vec<CartItem>) -> StoreResult<Self> {
        let mut total_quantity: u64 = 0;
        let mut sub_total = Decimal::ZERO;
        for item in &items {
            total_quantity += u64::from(item.cart_quantity);
            sub_total = item
                .line_total()
                .and_then(|line| sub_total.checked_add(line))
                .ok_or_else(|| StoreError::validation("cart total is too large"))?;
        }
        Ok(Self {
            items,
            total_quantity,
            sub_total,
        })
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    pub fn sub_total(&self) -> Decimal {
        self.sub_total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &RecordId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.item_id() == item_id)
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total_quantity: self.total_quantity,
            sub_total: self.sub_total,
        }
    }
}

impl TryFrom<CartSnapshot> for Cart {
    type Error = StoreError;

    fn try_from(snapshot: CartSnapshot) -> StoreResult<Self> {
        Cart::from_items(snapshot.items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OrderStatus {
    Placed = 1,
    InProgress = 2,
    Completed = 3,
}

impl TryFrom<u8> for OrderStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OrderStatus::Placed),
            2 => Ok(OrderStatus::InProgress),
            3 => Ok(OrderStatus::Completed),
            other => Err(format!("unknown order status {}", other)),
        }
    }
}

impl From<OrderStatus> for u8 {
    fn from(status: OrderStatus) -> Self {
        status as u8
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Placed => "placed",
            OrderStatus::InProgress => "in-progress",
            OrderStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "placed" => Ok(OrderStatus::Placed),
            "2" | "in-progress" | "in_progress" | "inprogress" => Ok(OrderStatus::InProgress),
            "3" | "completed" => Ok(OrderStatus::Completed),
            other => Err(format!(
                "unknown order status '{}' (expected placed, in-progress or completed)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: RecordId,
    pub name: String,
    pub contact: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub status: OrderStatus,
}

/// Body of `POST /orders/new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub name: String,
    pub contact: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub items: Vec<CartItem>,
}

/// Body of `PUT /orders/edit/<order_id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub order_id: RecordId,
    pub new_status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub telephone: String,
}

/// What the fulfillment hook is told when an order is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub order_id: RecordId,
    pub name: String,
    pub contact: String,
}

impl From<&Order> for CompletionNotice {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            name: order.name.clone(),
            contact: order.contact.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("<unnamed>")
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub success: bool,
}
