//! Settings mutator: the configuration document is replaced as a whole.

use tracing::info;

use crate::auth::require;
use crate::error::MutationError;
use crate::models::{GlobalSettings, Right, User};
use crate::store::StateStore;

/// Replace the global settings document. Requires the `settings` right.
pub fn replace_settings(
    store: &StateStore,
    caller: &User,
    settings: GlobalSettings,
) -> Result<(), MutationError> {
    require(caller, Right::Settings)?;

    let mut next = store.snapshot();
    next.settings = settings;
    store.commit(next);

    info!("settings replaced");
    Ok(())
}
