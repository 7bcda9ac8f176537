//! User administration mutators. Require the `users` right.

use tracing::info;

use crate::auth::require;
use crate::error::MutationError;
use crate::models::{new_id, Right, Role, User};
use crate::store::StateStore;

/// Arguments for creating a user; the id is generated here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub identifier: String,
    pub password: Option<String>,
    pub role: Role,
    pub rights: Vec<Right>,
}

pub fn add_user(store: &StateStore, caller: &User, new: NewUser) -> Result<User, MutationError> {
    require(caller, Right::Users)?;

    let identifier = new.identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(MutationError::validation("Identifier is required"));
    }

    let mut next = store.snapshot();

    // Operator usernames are unique case-insensitively; ad-hoc customer
    // entries are exempt (they are keyed by phone and created on login).
    if new.role != Role::Customer {
        let taken = next.users.iter().any(|u| {
            u.role != Role::Customer && u.identifier.eq_ignore_ascii_case(&identifier)
        });
        if taken {
            return Err(MutationError::validation("Username is already taken"));
        }
    }

    let user = User {
        id: new_id(),
        identifier,
        password: new.password,
        role: new.role,
        rights: new.rights,
    };
    next.users.push(user.clone());
    store.commit(next);

    info!(user = %user.identifier, role = ?user.role, "user added");
    Ok(user)
}

pub fn delete_user(store: &StateStore, caller: &User, user_id: &str) -> Result<(), MutationError> {
    require(caller, Right::Users)?;

    let mut next = store.snapshot();
    let before = next.users.len();
    next.users.retain(|u| u.id != user_id);
    if next.users.len() == before {
        return Err(MutationError::validation("User not found"));
    }
    store.commit(next);

    info!(id = user_id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> User {
        User::seed_admin()
    }

    fn test_store() -> std::sync::Arc<StateStore> {
        StateStore::open_in_memory(None).expect("open store")
    }

    fn staff(identifier: &str) -> NewUser {
        NewUser {
            identifier: identifier.to_string(),
            password: Some("secret".to_string()),
            role: Role::Staff,
            rights: vec![Right::Orders],
        }
    }

    #[test]
    fn add_appends_and_delete_filters_by_id() {
        let store = test_store();
        let caller = admin();

        let added = add_user(&store, &caller, staff("Rider01")).expect("add");
        assert_eq!(store.snapshot().users.last().expect("last").id, added.id);

        delete_user(&store, &caller, &added.id).expect("delete");
        assert!(store.snapshot().users.iter().all(|u| u.id != added.id));
    }

    #[test]
    fn staff_usernames_are_unique_case_insensitively() {
        let store = test_store();
        let caller = admin();
        add_user(&store, &caller, staff("Rider01")).expect("add");

        let err = add_user(&store, &caller, staff("rider01")).expect_err("must reject");
        assert!(matches!(err, MutationError::Validation(_)));
    }

    #[test]
    fn duplicate_customer_phones_are_allowed() {
        let store = test_store();
        let caller = admin();
        let customer = NewUser {
            identifier: "03001234567".to_string(),
            password: None,
            role: Role::Customer,
            rights: Vec::new(),
        };
        add_user(&store, &caller, customer.clone()).expect("add");
        add_user(&store, &caller, customer).expect("add again");
    }

    #[test]
    fn user_admin_requires_the_users_right() {
        let store = test_store();
        let mut caller = admin();
        caller.rights = vec![Right::Orders];

        let err = add_user(&store, &caller, staff("Rider01")).expect_err("must reject");
        assert_eq!(
            err,
            MutationError::Unauthorized {
                required: Right::Users
            }
        );
    }
}
