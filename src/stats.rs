//! Read-side aggregations over a snapshot.
//!
//! Nothing here is persisted or cached; every view recomputes from the
//! snapshot it is handed, so it is always consistent with the current state.

use crate::models::{MasterState, OrderStatus};

/// Total revenue: sum of totals of delivered orders.
pub fn revenue(state: &MasterState) -> f64 {
    state
        .orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .map(|o| o.total)
        .sum()
}

/// Orders still in the kitchen: Pending or Preparing.
pub fn pending_count(state: &MasterState) -> usize {
    state
        .orders
        .iter()
        .filter(|o| matches!(o.status, OrderStatus::Pending | OrderStatus::Preparing))
        .count()
}

pub fn order_count(state: &MasterState) -> usize {
    state.orders.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_id, now_ms, Order};

    fn order(status: OrderStatus, total: f64) -> Order {
        Order {
            id: new_id(),
            customer_name: "Bilal".to_string(),
            phone: "03001234567".to_string(),
            address: String::new(),
            items: Vec::new(),
            total,
            status,
            created_at: now_ms(),
        }
    }

    #[test]
    fn revenue_counts_only_delivered_orders() {
        let mut state = MasterState::seed();
        state.orders = vec![
            order(OrderStatus::Delivered, 500.0),
            order(OrderStatus::Delivered, 750.0),
            order(OrderStatus::Pending, 900.0),
            order(OrderStatus::Cancelled, 450.0),
        ];
        assert_eq!(revenue(&state), 1250.0);
    }

    #[test]
    fn pending_count_covers_pending_and_preparing() {
        let mut state = MasterState::seed();
        state.orders = vec![
            order(OrderStatus::Pending, 500.0),
            order(OrderStatus::Preparing, 300.0),
            order(OrderStatus::OutForDelivery, 600.0),
            order(OrderStatus::Delivered, 700.0),
        ];
        assert_eq!(pending_count(&state), 2);
        assert_eq!(order_count(&state), 4);
    }
}
