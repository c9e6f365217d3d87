pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod refresh;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{
    AuthResponse, Cart, CartItem, CartSnapshot, CheckoutForm, CompletionNotice, Credentials,
    DeleteProductRequest, LogoutResponse, NewProduct, Order, OrderRequest, OrderStatus, Product,
    RecordId, StatusUpdate, User,
};
pub use crate::domain::ports::{
    AccountService, Backend, CartStorage, CatalogAdmin, CatalogSource, ConfigProvider,
    NotificationSender, OrderStore,
};
pub use crate::utils::error::Result;
