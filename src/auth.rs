//! Session identity and capability checks.
//!
//! Customer login is a formality: it synthesizes an ad-hoc customer user and
//! always succeeds. Staff login compares the supplied username
//! case-insensitively against the privileged bootstrap identity and the
//! `users` list, with an exact plaintext password match — a documented
//! weakness that is deliberately preserved, not hardened. Capability checks
//! happen at the mutator boundary via [`require`], not in the UI layer.

use tracing::{info, warn};

use crate::error::MutationError;
use crate::models::{new_id, Right, Role, User};
use crate::store::StateStore;

/// The privileged bootstrap identity. Works regardless of the `users` list.
pub const BOOTSTRAP_USERNAME: &str = "Ansar";
pub const BOOTSTRAP_PASSWORD: &str = "ansar123";

/// Reject the call unless the caller holds `right`.
pub fn require(caller: &User, right: Right) -> Result<(), MutationError> {
    if caller.has_right(right) {
        Ok(())
    } else {
        warn!(caller = %caller.identifier, required = %right, "mutation rejected: missing right");
        Err(MutationError::Unauthorized { required: right })
    }
}

/// Log a customer in by phone number.
///
/// Synthesizes a new customer user (no password, no rights), records it in
/// the shared state, and makes it the active session identity. Always
/// succeeds; any input vetting happens in the UI layer.
pub fn customer_login(store: &StateStore, phone: &str) -> User {
    let user = User {
        id: new_id(),
        identifier: phone.trim().to_string(),
        password: None,
        role: Role::Customer,
        rights: Vec::new(),
    };

    let mut next = store.snapshot();
    next.users.push(user.clone());
    store.commit(next);

    store.set_session(user.clone());
    info!(phone = %user.identifier, "customer session started");
    user
}

/// Log an operator in. Returns false on any mismatch; never errors.
pub fn staff_login(store: &StateStore, username: &str, password: &str) -> bool {
    let username = username.trim();

    // The bootstrap identity works even on an empty users list.
    if username.eq_ignore_ascii_case(BOOTSTRAP_USERNAME) && password == BOOTSTRAP_PASSWORD {
        let user = User {
            id: new_id(),
            identifier: BOOTSTRAP_USERNAME.to_string(),
            password: None,
            role: Role::Admin,
            rights: Right::ALL.to_vec(),
        };
        store.set_session(user);
        info!("bootstrap admin session started");
        return true;
    }

    let state = store.snapshot();
    let matched = state.users.iter().find(|u| {
        u.role != Role::Customer
            && u.identifier.eq_ignore_ascii_case(username)
            && u.password.as_deref() == Some(password)
    });

    match matched {
        Some(user) => {
            store.set_session(user.clone());
            info!(user = %user.identifier, "staff session started");
            true
        }
        None => {
            warn!(user = username, "staff login rejected");
            false
        }
    }
}

/// End the active session: clears the persisted identity and empties the
/// session cart.
pub fn logout(store: &StateStore) {
    store.clear_session();
    store.cart_clear();
    info!("session ended");
}
