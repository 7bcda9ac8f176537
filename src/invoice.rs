//! Plain-text invoice rendering.
//!
//! Given one order and the current settings, produces a fixed-width
//! human-readable document. Pure read; the presentation layer decides how to
//! display or print it.

use chrono::{DateTime, Utc};

use crate::models::{GlobalSettings, Order};

/// Character width of the rendered document.
const WIDTH: usize = 42;

/// Render one order as a text invoice.
pub fn render_invoice(order: &Order, settings: &GlobalSettings) -> String {
    let mut out = String::new();
    let rule = "-".repeat(WIDTH);
    let currency = settings.general.currency.as_str();

    out.push_str(&center(&settings.general.app_name.to_uppercase()));
    out.push_str(&center("INVOICE"));
    out.push_str(&rule);
    out.push('\n');

    out.push_str(&format!("Order:    #{}\n", short_id(&order.id)));
    out.push_str(&format!("Date:     {}\n", format_created_at(order.created_at)));
    out.push_str(&format!("Customer: {}\n", order.customer_name));
    out.push_str(&format!("Phone:    {}\n", order.phone));
    if !order.address.trim().is_empty() {
        out.push_str(&format!("Address:  {}\n", order.address));
    }
    out.push_str(&format!("Status:   {:?}\n", order.status));
    out.push_str(&rule);
    out.push('\n');

    let mut subtotal = 0.0;
    for line in &order.items {
        subtotal += line.subtotal();
        out.push_str(&split_line(
            &format!("{} x {}", line.quantity, line.name),
            &format!("{currency} {:.0}", line.subtotal()),
        ));
    }
    out.push_str(&rule);
    out.push('\n');

    let delivery_fee = order.total - subtotal;
    out.push_str(&split_line("Subtotal", &format!("{currency} {subtotal:.0}")));
    out.push_str(&split_line(
        "Delivery fee",
        &format!("{currency} {delivery_fee:.0}"),
    ));
    out.push_str(&split_line("TOTAL", &format!("{currency} {:.0}", order.total)));
    out.push_str(&rule);
    out.push('\n');

    out.push_str(&center(&format!(
        "Support: {}",
        settings.general.support_phone
    )));
    out.push_str(&center("Thank you for your order!"));

    out
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect::<String>().to_uppercase()
}

fn format_created_at(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn center(text: &str) -> String {
    if text.len() >= WIDTH {
        return format!("{text}\n");
    }
    let pad = (WIDTH - text.len()) / 2;
    format!("{}{text}\n", " ".repeat(pad))
}

/// Label left, amount right, padded to the document width.
fn split_line(label: &str, amount: &str) -> String {
    let space = WIDTH.saturating_sub(label.len() + amount.len()).max(1);
    format!("{label}{}{amount}\n", " ".repeat(space))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_id, CartItem, OrderStatus};

    fn sample_order() -> Order {
        Order {
            id: "a1b2c3d4-0000-0000-0000-000000000000".to_string(),
            customer_name: "Bilal".to_string(),
            phone: "03001234567".to_string(),
            address: "House 12, Block F".to_string(),
            items: vec![
                CartItem {
                    item_id: new_id(),
                    name: "Chicken Biryani".to_string(),
                    price: 450.0,
                    quantity: 1,
                    restaurant_id: "r".to_string(),
                    restaurant_name: "Ansar Biryani House".to_string(),
                },
                CartItem {
                    item_id: new_id(),
                    name: "Raita".to_string(),
                    price: 50.0,
                    quantity: 2,
                    restaurant_id: "r".to_string(),
                    restaurant_name: "Ansar Biryani House".to_string(),
                },
            ],
            total: 550.0,
            status: OrderStatus::Pending,
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn invoice_contains_items_totals_and_header() {
        let doc = render_invoice(&sample_order(), &GlobalSettings::default());

        assert!(doc.contains("PLATEFRONT"));
        assert!(doc.contains("#A1B2C3D4"));
        assert!(doc.contains("1 x Chicken Biryani"));
        assert!(doc.contains("2 x Raita"));
        assert!(doc.contains("Rs. 450"));
        assert!(doc.contains("Rs. 100"));
        assert!(doc.contains("TOTAL"));
        assert!(doc.contains("Rs. 550"));
    }

    #[test]
    fn delivery_fee_is_derived_from_the_fixed_total() {
        let mut order = sample_order();
        order.total = 600.0; // 550 items + 50 fee at creation time
        let doc = render_invoice(&order, &GlobalSettings::default());
        assert!(doc.contains("Delivery fee"));
        assert!(doc.contains("Rs. 50"));
    }

    #[test]
    fn rendering_does_not_mutate_inputs() {
        let order = sample_order();
        let settings = GlobalSettings::default();
        let before = order.clone();
        render_invoice(&order, &settings);
        assert_eq!(order, before);
    }
}
