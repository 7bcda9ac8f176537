//! Order mutators.
//!
//! Placing an order is the customer flow and needs no operator right; the
//! total is fixed at creation time (item subtotals plus the configured
//! delivery fee) and never re-validated afterwards. Order management
//! (replace, status transitions) requires the `orders` right. The orders
//! list is kept most-recent-first.

use tracing::info;

use crate::auth::require;
use crate::error::MutationError;
use crate::models::{new_id, now_ms, CartItem, Order, OrderStatus, Right, User};
use crate::store::StateStore;

/// Arguments for placing an order; id, total, status, and creation time are
/// computed here.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub items: Vec<CartItem>,
}

/// Place a new order at the head of the list with status `Pending`.
pub fn place_order(store: &StateStore, new: NewOrder) -> Result<Order, MutationError> {
    if new.customer_name.trim().is_empty() {
        return Err(MutationError::validation("Customer name is required"));
    }
    if new.items.is_empty() {
        return Err(MutationError::validation("Order has no items"));
    }
    if new.items.iter().any(|line| line.quantity == 0) {
        return Err(MutationError::validation("Item quantity must be at least 1"));
    }

    let settings = store.snapshot().settings;
    let subtotal: f64 = new.items.iter().map(CartItem::subtotal).sum();
    if subtotal < settings.general.min_order_value {
        return Err(MutationError::validation(format!(
            "Minimum order value is {} {}",
            settings.general.currency, settings.general.min_order_value
        )));
    }

    let order = Order {
        id: new_id(),
        customer_name: new.customer_name.trim().to_string(),
        phone: new.phone,
        address: new.address,
        items: new.items,
        total: subtotal + settings.general.delivery_fee,
        status: OrderStatus::Pending,
        created_at: now_ms(),
    };

    let mut next = store.snapshot();
    next.orders.insert(0, order.clone());
    store.commit(next);

    info!(id = %order.id, total = order.total, "order placed");
    Ok(order)
}

/// Replace an order wholesale, matched by id.
pub fn update_order(store: &StateStore, caller: &User, order: Order) -> Result<(), MutationError> {
    require(caller, Right::Orders)?;

    let mut next = store.snapshot();
    let slot = next
        .orders
        .iter_mut()
        .find(|o| o.id == order.id)
        .ok_or_else(|| MutationError::validation("Order not found"))?;
    *slot = order;
    store.commit(next);
    Ok(())
}

/// Move an order to `status`, replacing only the status field.
///
/// Cancelled is reachable from any non-terminal status and is absorbing:
/// requests to transition a terminal order are permitted no-ops that return
/// the unchanged status. Returns the order's resulting status.
pub fn set_status(
    store: &StateStore,
    caller: &User,
    order_id: &str,
    status: OrderStatus,
) -> Result<OrderStatus, MutationError> {
    require(caller, Right::Orders)?;

    let current = store
        .snapshot()
        .order(order_id)
        .map(|o| o.status)
        .ok_or_else(|| MutationError::validation("Order not found"))?;

    if current.is_terminal() {
        info!(id = order_id, ?current, requested = ?status, "ignoring transition from terminal status");
        return Ok(current);
    }

    let mut updated = store
        .snapshot()
        .order(order_id)
        .cloned()
        .ok_or_else(|| MutationError::validation("Order not found"))?;
    updated.status = status;
    update_order(store, caller, updated)?;

    info!(id = order_id, from = ?current, to = ?status, "order status changed");
    Ok(status)
}
