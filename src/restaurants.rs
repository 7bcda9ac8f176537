//! Restaurant and menu mutators.
//!
//! Each operation computes a full next snapshot from the current one and
//! pipes it through the mutation gateway. Menu items live exclusively inside
//! their owning restaurant, so every menu operation locates the owner, splices
//! the modified menu list in, and delegates to the restaurant-replace path.
//! All operations here require the `restaurants` right.

use tracing::info;

use crate::auth::require;
use crate::error::MutationError;
use crate::models::{new_id, MenuItem, Restaurant, Right, User};
use crate::store::StateStore;

/// Arguments for creating a restaurant; the id is generated here.
#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub name: String,
    pub cuisine: String,
    pub rating: f64,
    pub image: String,
    pub delivery_time: String,
}

/// Arguments for creating a menu item; the id is generated here.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: String,
}

// ---------------------------------------------------------------------------
// Restaurants
// ---------------------------------------------------------------------------

pub fn add_restaurant(
    store: &StateStore,
    caller: &User,
    new: NewRestaurant,
) -> Result<Restaurant, MutationError> {
    require(caller, Right::Restaurants)?;
    if new.name.trim().is_empty() {
        return Err(MutationError::validation("Restaurant name is required"));
    }

    let restaurant = Restaurant {
        id: new_id(),
        name: new.name.trim().to_string(),
        cuisine: new.cuisine,
        rating: new.rating,
        image: new.image,
        delivery_time: new.delivery_time,
        menu: Vec::new(),
    };

    let mut next = store.snapshot();
    next.restaurants.push(restaurant.clone());
    store.commit(next);

    info!(id = %restaurant.id, name = %restaurant.name, "restaurant added");
    Ok(restaurant)
}

/// Replace a restaurant wholesale, matched by id.
pub fn update_restaurant(
    store: &StateStore,
    caller: &User,
    restaurant: Restaurant,
) -> Result<(), MutationError> {
    require(caller, Right::Restaurants)?;

    let mut next = store.snapshot();
    let slot = next
        .restaurants
        .iter_mut()
        .find(|r| r.id == restaurant.id)
        .ok_or_else(|| MutationError::validation("Restaurant not found"))?;
    *slot = restaurant;
    store.commit(next);
    Ok(())
}

/// Delete a restaurant. Its menu is discarded with it; menu items have no
/// independent lifecycle.
pub fn delete_restaurant(
    store: &StateStore,
    caller: &User,
    restaurant_id: &str,
) -> Result<(), MutationError> {
    require(caller, Right::Restaurants)?;

    let mut next = store.snapshot();
    let before = next.restaurants.len();
    next.restaurants.retain(|r| r.id != restaurant_id);
    if next.restaurants.len() == before {
        return Err(MutationError::validation("Restaurant not found"));
    }
    store.commit(next);

    info!(id = restaurant_id, "restaurant deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Menu items
// ---------------------------------------------------------------------------

fn owning_restaurant(
    store: &StateStore,
    restaurant_id: &str,
) -> Result<Restaurant, MutationError> {
    if restaurant_id.trim().is_empty() {
        return Err(MutationError::validation(
            "Select a restaurant before saving a menu item",
        ));
    }
    store
        .snapshot()
        .restaurant(restaurant_id)
        .cloned()
        .ok_or_else(|| MutationError::validation("Restaurant not found"))
}

fn validate_item(name: &str, price: f64) -> Result<(), MutationError> {
    if name.trim().is_empty() {
        return Err(MutationError::validation("Item name is required"));
    }
    if price < 0.0 {
        return Err(MutationError::validation("Item price cannot be negative"));
    }
    Ok(())
}

pub fn add_menu_item(
    store: &StateStore,
    caller: &User,
    restaurant_id: &str,
    new: NewMenuItem,
) -> Result<MenuItem, MutationError> {
    require(caller, Right::Restaurants)?;
    validate_item(&new.name, new.price)?;

    let mut owner = owning_restaurant(store, restaurant_id)?;
    let item = MenuItem {
        id: new_id(),
        name: new.name.trim().to_string(),
        description: new.description,
        price: new.price,
        category: new.category,
        image: new.image,
    };
    owner.menu.push(item.clone());
    update_restaurant(store, caller, owner)?;

    info!(restaurant = restaurant_id, item = %item.id, "menu item added");
    Ok(item)
}

/// Replace a menu item by id within its owning restaurant. Last write wins.
pub fn update_menu_item(
    store: &StateStore,
    caller: &User,
    restaurant_id: &str,
    item: MenuItem,
) -> Result<(), MutationError> {
    require(caller, Right::Restaurants)?;
    validate_item(&item.name, item.price)?;

    let mut owner = owning_restaurant(store, restaurant_id)?;
    let slot = owner
        .menu
        .iter_mut()
        .find(|m| m.id == item.id)
        .ok_or_else(|| MutationError::validation("Menu item not found"))?;
    *slot = item;
    update_restaurant(store, caller, owner)
}

pub fn delete_menu_item(
    store: &StateStore,
    caller: &User,
    restaurant_id: &str,
    item_id: &str,
) -> Result<(), MutationError> {
    require(caller, Right::Restaurants)?;

    let mut owner = owning_restaurant(store, restaurant_id)?;
    owner.menu.retain(|m| m.id != item_id);
    update_restaurant(store, caller, owner)
}
