//! Remote/local snapshot reconciliation.
//!
//! On every notification from the mirror there are exactly three cases: the
//! shared document does not exist yet (this client bootstraps it from its
//! local snapshot), the document is strictly newer than the live snapshot
//! (adopt it), or it is not (ignore it — this also swallows echoes of our
//! own writes and stale reads). Any mirror error is caught, logged, and
//! means "keep running local-only"; reconciliation is never fatal.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::MirrorError;
use crate::models::MasterState;
use crate::store::StateStore;

/// What a single reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The shared document was missing; it now holds our local snapshot.
    Bootstrapped,
    /// The remote document was strictly newer and replaced the live snapshot.
    Adopted,
    /// The remote document was not newer; nothing changed.
    Unchanged,
}

/// Fold one fetched document into the store.
pub fn apply_remote(
    store: &StateStore,
    fetched: Option<MasterState>,
) -> Result<SyncOutcome, MirrorError> {
    match fetched {
        None => {
            // First writer bootstraps the shared document.
            let local = store.snapshot();
            if let Some(mirror) = store.mirror() {
                mirror.publish(&local)?;
            }
            info!(timestamp = local.timestamp, "bootstrapped mirror from local snapshot");
            Ok(SyncOutcome::Bootstrapped)
        }
        Some(remote) => {
            // The strictly-newer check lives inside adopt, under the state
            // write lock, so a commit racing this pass cannot be overwritten
            // by a document that stopped being newer after the fetch.
            if store.adopt(remote) {
                Ok(SyncOutcome::Adopted)
            } else {
                Ok(SyncOutcome::Unchanged)
            }
        }
    }
}

/// Run one fetch-and-apply pass against the configured mirror.
fn poll_once(store: &StateStore) -> Result<SyncOutcome, MirrorError> {
    let mirror = match store.mirror() {
        Some(m) => m,
        None => return Ok(SyncOutcome::Unchanged),
    };
    let fetched = mirror.fetch()?;
    apply_remote(store, fetched)
}

/// Open the standing subscription to the shared document.
///
/// Push delivery is approximated by polling at `poll_interval`; the adoption
/// rule makes the two equivalent, since only a later-stamped document is ever
/// folded in. The first pass outcome, success or error, resolves the store's
/// initializing flag so first paint is gated by at most one poll.
pub fn spawn_subscription(
    store: Arc<StateStore>,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if store.mirror().is_none() {
            store.finish_initializing();
            return;
        }

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("mirror subscription cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let passed = Arc::clone(&store);
            let result = tokio::task::spawn_blocking(move || poll_once(&passed)).await;

            match result {
                Ok(Ok(outcome)) => {
                    if store.finish_initializing() {
                        info!(?outcome, "first mirror sync complete");
                    }
                }
                Ok(Err(e)) => {
                    // Proceed local-only; the next tick retries.
                    if store.finish_initializing() {
                        warn!("mirror unreachable, starting local-only: {e}");
                    } else {
                        warn!("mirror sync failed: {e}");
                    }
                }
                Err(e) => {
                    warn!("mirror sync task panicked: {e}");
                    store.finish_initializing();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::{InMemoryMirror, Mirror};

    /// Mirror double that always fails, for local-only fallback tests.
    struct DeadMirror;

    impl Mirror for DeadMirror {
        fn fetch(&self) -> Result<Option<MasterState>, MirrorError> {
            Err(MirrorError::Unavailable("mirror is down".to_string()))
        }

        fn publish(&self, _snapshot: &MasterState) -> Result<(), MirrorError> {
            Err(MirrorError::Unavailable("mirror is down".to_string()))
        }
    }

    fn store_with(mirror: Arc<dyn Mirror>) -> Arc<StateStore> {
        StateStore::open_in_memory(Some(mirror)).expect("open store")
    }

    #[test]
    fn missing_document_is_bootstrapped_from_local() {
        let mirror = Arc::new(InMemoryMirror::new());
        let store = store_with(mirror.clone());

        let outcome = apply_remote(&store, None).expect("apply");
        assert_eq!(outcome, SyncOutcome::Bootstrapped);
        assert_eq!(
            mirror.document().expect("document").timestamp,
            store.timestamp()
        );
    }

    #[test]
    fn strictly_newer_remote_is_adopted_and_persisted() {
        let mirror = Arc::new(InMemoryMirror::new());
        let store = store_with(mirror);

        let mut remote = MasterState::seed();
        remote.restaurants.clear();
        remote.timestamp = store.timestamp() + 5_000;

        let outcome = apply_remote(&store, Some(remote.clone())).expect("apply");
        assert_eq!(outcome, SyncOutcome::Adopted);
        assert_eq!(store.snapshot(), remote);
    }

    #[test]
    fn equal_or_older_remote_is_ignored() {
        let mirror = Arc::new(InMemoryMirror::new());
        let store = store_with(mirror);
        let before = store.snapshot();

        let mut echo = before.clone();
        let outcome = apply_remote(&store, Some(echo.clone())).expect("apply");
        assert_eq!(outcome, SyncOutcome::Unchanged);

        echo.timestamp = before.timestamp - 1;
        let outcome = apply_remote(&store, Some(echo)).expect("apply");
        assert_eq!(outcome, SyncOutcome::Unchanged);

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn adoption_guard_holds_when_commit_races_the_fetch() {
        let mirror = Arc::new(InMemoryMirror::new());
        let store = store_with(mirror);

        // Strictly newer when fetched...
        let mut fetched = store.snapshot();
        fetched.timestamp += 1;
        fetched.restaurants[0].name = "Remote Kitchen".to_string();

        // ...but a commit lands before the document is applied.
        let committed = store.commit(store.snapshot());
        assert!(committed.timestamp >= fetched.timestamp);

        let outcome = apply_remote(&store, Some(fetched)).expect("apply");
        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(store.snapshot(), committed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscription_adopts_newer_remote_and_resolves_init_flag() {
        let mirror = Arc::new(InMemoryMirror::new());
        let store = store_with(mirror.clone());
        assert!(store.is_initializing());

        let mut remote = MasterState::seed();
        remote.restaurants[0].name = "Remote Kitchen".to_string();
        remote.timestamp = store.timestamp() + 5_000;
        mirror.put(remote.clone());

        let cancel = CancellationToken::new();
        let handle = spawn_subscription(
            Arc::clone(&store),
            Duration::from_millis(10),
            cancel.clone(),
        );

        for _ in 0..200 {
            if !store.is_initializing() && store.timestamp() == remote.timestamp {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!store.is_initializing());
        assert_eq!(store.snapshot(), remote);

        cancel.cancel();
        handle.await.expect("subscription task join");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_mirror_falls_back_to_local_only() {
        let store = store_with(Arc::new(DeadMirror));
        let before = store.snapshot();
        assert!(store.is_initializing());

        let cancel = CancellationToken::new();
        let handle = spawn_subscription(
            Arc::clone(&store),
            Duration::from_millis(10),
            cancel.clone(),
        );

        for _ in 0..200 {
            if !store.is_initializing() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!store.is_initializing(), "error must resolve the init flag");
        assert_eq!(store.snapshot(), before, "local snapshot stays authoritative");

        cancel.cancel();
        handle.await.expect("subscription task join");
    }
}
