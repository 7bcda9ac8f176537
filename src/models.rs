//! Data model for the replicated storefront state.
//!
//! `MasterState` is the single aggregate root. It is replicated as a whole:
//! every accepted mutation produces a fresh snapshot, and the `_timestamp`
//! field (wall-clock milliseconds) is the sole conflict-resolution signal
//! between the local cache and the remote mirror. Field names and nesting
//! must round-trip losslessly through JSON.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Aggregate root
// ---------------------------------------------------------------------------

/// The full replicated application state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterState {
    /// Insertion order is list order.
    pub restaurants: Vec<Restaurant>,
    /// Most-recent-first.
    pub orders: Vec<Order>,
    pub users: Vec<User>,
    pub settings: GlobalSettings,
    /// Monotonically increasing write stamp (wall-clock ms).
    #[serde(rename = "_timestamp")]
    pub timestamp: i64,
}

impl MasterState {
    /// Default snapshot used when no local cache exists yet: one seed
    /// restaurant, no orders, the seeded admin user, default settings,
    /// stamped with the current time.
    pub fn seed() -> Self {
        Self {
            restaurants: vec![Restaurant::seed()],
            orders: Vec::new(),
            users: vec![User::seed_admin()],
            settings: GlobalSettings::default(),
            timestamp: now_ms(),
        }
    }

    pub fn restaurant(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a fresh entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Restaurants and menus
// ---------------------------------------------------------------------------

/// A restaurant and the menu it exclusively owns. Menu items have no
/// lifecycle of their own; deleting the restaurant discards them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    /// Free-text, comma-separated cuisine tags.
    pub cuisine: String,
    pub rating: f64,
    pub image: String,
    /// Human-readable delivery estimate, e.g. "30-45 min".
    pub delivery_time: String,
    pub menu: Vec<MenuItem>,
}

impl Restaurant {
    fn seed() -> Self {
        Self {
            id: new_id(),
            name: "Ansar Biryani House".to_string(),
            cuisine: "Biryani, BBQ, Pakistani".to_string(),
            rating: 4.7,
            image: String::new(),
            delivery_time: "30-45 min".to_string(),
            menu: vec![
                MenuItem {
                    id: new_id(),
                    name: "Chicken Biryani".to_string(),
                    description: "Full plate with shami kabab".to_string(),
                    price: 450.0,
                    category: "Rice".to_string(),
                    image: String::new(),
                },
                MenuItem {
                    id: new_id(),
                    name: "Raita".to_string(),
                    description: "Mint yogurt".to_string(),
                    price: 50.0,
                    category: "Sides".to_string(),
                    image: String::new(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    /// Unique within the owning restaurant.
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: String,
}

// ---------------------------------------------------------------------------
// Orders and cart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Preparing,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses accept no further transitions through normal flow.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    /// Contact identifier (phone number).
    pub phone: String,
    /// Free text, or derived from geolocation by the UI layer.
    pub address: String,
    pub items: Vec<CartItem>,
    /// Item subtotals plus delivery fee, fixed at creation time.
    pub total: f64,
    pub status: OrderStatus,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// One line of the session cart. Session-only: carts are never part of
/// `MasterState` and are cleared on logout or successful order submission.
/// The restaurant reference is a snapshot taken at add-time and is not
/// re-validated against later menu changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub item_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub restaurant_id: String,
    pub restaurant_name: String,
}

impl CartItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// Build a quantity-1 cart line from a menu item.
    pub fn from_menu_item(item: &MenuItem, restaurant: &Restaurant) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: 1,
            restaurant_id: restaurant.id.clone(),
            restaurant_name: restaurant.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users and rights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
    Staff,
}

/// Permission tags gating operator capabilities. Checked at the mutator
/// boundary, not only in the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    Orders,
    Restaurants,
    Users,
    Settings,
}

impl Right {
    pub const ALL: [Right; 4] = [
        Right::Orders,
        Right::Restaurants,
        Right::Users,
        Right::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Right::Orders => "orders",
            Right::Restaurants => "restaurants",
            Right::Users => "users",
            Right::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Right {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    /// Phone number for customers, username for staff/admin. Staff usernames
    /// compare case-insensitively.
    pub identifier: String,
    /// Plaintext, staff/admin only. Known weakness carried over from the
    /// documented behavior; customers have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    pub rights: Vec<Right>,
}

impl User {
    pub fn has_right(&self, right: Right) -> bool {
        self.rights.contains(&right)
    }

    /// The seeded admin account present in every fresh snapshot.
    pub fn seed_admin() -> Self {
        Self {
            id: new_id(),
            identifier: crate::auth::BOOTSTRAP_USERNAME.to_string(),
            password: Some(crate::auth::BOOTSTRAP_PASSWORD.to_string()),
            role: Role::Admin,
            rights: Right::ALL.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Global configuration document. Mutated as a whole; sections are not
/// independently versioned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalSettings {
    pub general: GeneralSettings,
    pub commissions: CommissionSettings,
    pub payments: PaymentSettings,
    pub notifications: NotificationSettings,
    pub marketing: MarketingSettings,
    pub features: FeatureSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    pub app_name: String,
    pub currency: String,
    pub delivery_fee: f64,
    pub min_order_value: f64,
    pub support_phone: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            app_name: "Platefront".to_string(),
            currency: "Rs.".to_string(),
            delivery_fee: 0.0,
            min_order_value: 0.0,
            support_phone: "0300-0000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionSettings {
    pub rate_percent: f64,
    pub per_order_fee: f64,
}

impl Default for CommissionSettings {
    fn default() -> Self {
        Self {
            rate_percent: 10.0,
            per_order_fee: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentSettings {
    pub cash_on_delivery: bool,
    pub card_payments: bool,
    pub wallet_name: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            cash_on_delivery: true,
            card_payments: false,
            wallet_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    pub order_placed: bool,
    pub order_delivered: bool,
    pub promotions: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            order_placed: true,
            order_delivered: true,
            promotions: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketingSettings {
    pub banner_text: String,
    pub promo_code: String,
    pub discount_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSettings {
    pub ai_images: bool,
    pub geolocation: bool,
    pub install_prompt: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            ai_images: false,
            geolocation: true,
            install_prompt: true,
        }
    }
}
