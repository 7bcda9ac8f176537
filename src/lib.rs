//! Platefront state core.
//!
//! The replicated application-state layer of the Platefront food-delivery
//! storefront: a single `MasterState` document held live in memory, cached in
//! local SQLite, and optionally mirrored to a remote document store with
//! last-writer-wins reconciliation. The rendering layer consumes snapshots
//! and expresses user intent as calls to the mutators in the domain modules.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use platefront::{config::MirrorConfig, mirror::{HttpMirror, Mirror}};
//! use tokio_util::sync::CancellationToken;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! platefront::init_tracing();
//!
//! let mirror: Option<Arc<dyn Mirror>> = match MirrorConfig::from_env() {
//!     Some(cfg) => Some(Arc::new(HttpMirror::new(&cfg)?)),
//!     None => None,
//! };
//! let store = platefront::store::StateStore::open("data".as_ref(), mirror)?;
//!
//! let cancel = CancellationToken::new();
//! let runtime = tokio::runtime::Runtime::new()?;
//! let _subscription = runtime.block_on(async {
//!     platefront::reconciler::spawn_subscription(
//!         Arc::clone(&store),
//!         platefront::config::DEFAULT_POLL_INTERVAL,
//!         cancel.clone(),
//!     )
//! });
//! # Ok(())
//! # }
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod invoice;
pub mod mirror;
pub mod models;
pub mod orders;
pub mod reconciler;
pub mod restaurants;
pub mod services;
pub mod settings;
pub mod stats;
pub mod store;
pub mod users;

pub use error::{MirrorError, MutationError, StoreError};
pub use models::MasterState;
pub use store::StateStore;

/// Initialize structured logging (console).
///
/// Honors `RUST_LOG`; defaults to info globally and debug for this crate.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,platefront=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

#[cfg(test)]
mod tests {
    //! End-to-end flow over the public surface: operator sets up the menu,
    //! a customer builds a cart and orders, the kitchen delivers.

    use crate::models::{CartItem, OrderStatus};
    use crate::restaurants::{NewMenuItem, NewRestaurant};

    #[test]
    fn storefront_flow_from_login_to_revenue() {
        let store = crate::store::StateStore::open_in_memory(None).expect("open store");

        // Operator side.
        assert!(crate::auth::staff_login(&store, "ansar", crate::auth::BOOTSTRAP_PASSWORD));
        let operator = store.session().expect("operator session");

        let restaurant = crate::restaurants::add_restaurant(
            &store,
            &operator,
            NewRestaurant {
                name: "Lahore Chargha".to_string(),
                cuisine: "Chargha, BBQ".to_string(),
                rating: 4.4,
                image: String::new(),
                delivery_time: "45-60 min".to_string(),
            },
        )
        .expect("add restaurant");
        let item = crate::restaurants::add_menu_item(
            &store,
            &operator,
            &restaurant.id,
            NewMenuItem {
                name: "Full Chargha".to_string(),
                description: "Steam roasted".to_string(),
                price: 1200.0,
                category: "Mains".to_string(),
                image: String::new(),
            },
        )
        .expect("add item");
        crate::auth::logout(&store);

        // Customer side.
        crate::auth::customer_login(&store, "03211234567");
        store.cart_add(CartItem::from_menu_item(
            &item,
            store.snapshot().restaurant(&restaurant.id).expect("restaurant"),
        ));
        let order = crate::orders::place_order(
            &store,
            crate::orders::NewOrder {
                customer_name: "Sana".to_string(),
                phone: "03211234567".to_string(),
                address: "Flat 3, Gulberg".to_string(),
                items: store.cart(),
            },
        )
        .expect("place order");
        store.cart_clear();

        // Back office fulfils it.
        assert!(crate::auth::staff_login(&store, "Ansar", crate::auth::BOOTSTRAP_PASSWORD));
        let operator = store.session().expect("operator session");
        for status in [
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            crate::orders::set_status(&store, &operator, &order.id, status).expect("transition");
        }

        let state = store.snapshot();
        assert_eq!(crate::stats::revenue(&state), 1200.0);
        assert_eq!(crate::stats::pending_count(&state), 0);

        let doc = crate::invoice::render_invoice(
            state.order(&order.id).expect("order"),
            &state.settings,
        );
        assert!(doc.contains("Full Chargha"));
    }
}
