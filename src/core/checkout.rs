use crate::core::cart::CartEngine;
use crate::core::orders::OrderEngine;
use crate::core::{
    Cart, CartStorage, CheckoutForm, NotificationSender, Order, OrderRequest, OrderStore, Result,
};
use crate::utils::error::StoreError;
use crate::utils::validation::validate_non_empty_string;

/// Builds the `POST /orders/new` body from the form and a copy of the cart.
pub fn build_order_request(form: &CheckoutForm, cart: &Cart) -> Result<OrderRequest> {
    validate_non_empty_string("name", &form.name)?;
    validate_non_empty_string("telephone", &form.telephone)?;
    if cart.is_empty() {
        return Err(StoreError::validation("cannot check out an empty cart"));
    }

    Ok(OrderRequest {
        name: form.name.clone(),
        contact: form.telephone.clone(),
        total: cart.sub_total(),
        items: cart.items().to_vec(),
    })
}

/// Turns the cart into an order, then empties the cart.
///
/// Checkout is best-effort: once the create call has been issued the cart is
/// cleared whatever its outcome, and the create error (if any) is returned.
/// Form and cart validation happen before anything is submitted and leave
/// the cart untouched.
pub async fn checkout<S, O, N>(
    form: &CheckoutForm,
    cart: &mut CartEngine<S>,
    orders: &OrderEngine<O, N>,
) -> Result<Order>
where
    S: CartStorage,
    O: OrderStore + 'static,
    N: NotificationSender + 'static,
{
    let request = build_order_request(form, cart.cart())?;

    let created = orders.create_order(&request).await;
    if let Ok(order) = &created {
        orders.append_order(order.clone()).await;
    }

    let cleared = cart.clear_cart();

    match (created, cleared) {
        (Ok(order), Ok(())) => Ok(order),
        (Ok(order), Err(e)) => {
            tracing::error!(
                "Order {} was placed but the stored cart could not be removed: {}",
                order.order_id,
                e
            );
            Err(e)
        }
        (Err(e), cleared) => {
            tracing::warn!("Order submission failed; cart cleared anyway: {}", e);
            if let Err(clear_err) = cleared {
                tracing::error!("Stored cart could not be removed: {}", clear_err);
            }
            Err(e)
        }
    }
}
