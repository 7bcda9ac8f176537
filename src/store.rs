//! The owned state container and mutation gateway.
//!
//! `StateStore` is constructed once at process start and passed by `Arc` to
//! every consumer; there is no ambient global. All writes funnel through
//! [`StateStore::commit`], which stamps the snapshot, replaces the live copy
//! synchronously, persists it locally, and then pushes it to the mirror
//! fire-and-forget. The session identity and cart are process-local and are
//! never replicated.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::db::LocalStore;
use crate::error::StoreError;
use crate::mirror::Mirror;
use crate::models::{now_ms, CartItem, MasterState, User};

pub struct StateStore {
    live: RwLock<MasterState>,
    session: RwLock<Option<User>>,
    cart: RwLock<Vec<CartItem>>,
    local: LocalStore,
    mirror: Option<Arc<dyn Mirror>>,
    initializing: AtomicBool,
}

impl StateStore {
    /// Open the store backed by `{data_dir}/platefront.db`.
    ///
    /// Loads the last local snapshot (or synthesizes the seed snapshot) and
    /// restores any persisted session identity. The mirror is never consulted
    /// here, so startup cannot be blocked by the network; the reconciler
    /// folds remote state in later.
    pub fn open(data_dir: &Path, mirror: Option<Arc<dyn Mirror>>) -> Result<Arc<Self>, StoreError> {
        let local = LocalStore::open(data_dir)?;
        Self::from_local(local, mirror)
    }

    /// Store over an in-memory database, for tests.
    pub fn open_in_memory(mirror: Option<Arc<dyn Mirror>>) -> Result<Arc<Self>, StoreError> {
        let local = LocalStore::open_in_memory()?;
        Self::from_local(local, mirror)
    }

    fn from_local(
        local: LocalStore,
        mirror: Option<Arc<dyn Mirror>>,
    ) -> Result<Arc<Self>, StoreError> {
        let live = match local.load_snapshot()? {
            Some(state) => {
                info!(timestamp = state.timestamp, "loaded local snapshot");
                state
            }
            None => {
                info!("no local snapshot, seeding default state");
                let seeded = MasterState::seed();
                local.save_snapshot(&seeded)?;
                seeded
            }
        };
        let session = local.load_session()?;

        // Local-only mode needs no first-sync gate.
        let initializing = mirror.is_some();

        Ok(Arc::new(Self {
            live: RwLock::new(live),
            session: RwLock::new(session),
            cart: RwLock::new(Vec::new()),
            local,
            mirror,
            initializing: AtomicBool::new(initializing),
        }))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// A copy of the current live snapshot.
    pub fn snapshot(&self) -> MasterState {
        self.live.read().expect("state lock poisoned").clone()
    }

    /// The current live write stamp.
    pub fn timestamp(&self) -> i64 {
        self.live.read().expect("state lock poisoned").timestamp
    }

    pub fn mirror(&self) -> Option<&Arc<dyn Mirror>> {
        self.mirror.as_ref()
    }

    /// True until the first subscription outcome (sync or error) arrives.
    /// Downstream UI gates first paint on this.
    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::Acquire)
    }

    /// Resolve the initializing flag. Returns true only for the call that
    /// actually flipped it, so resolution happens exactly once.
    pub(crate) fn finish_initializing(&self) -> bool {
        self.initializing.swap(false, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Mutation gateway
    // -----------------------------------------------------------------------

    /// Accept a mutation: stamp, replace live state, persist, propagate.
    ///
    /// The stamp is wall-clock milliseconds, forced strictly above the
    /// previous one so back-to-back commits within the same millisecond stay
    /// ordered. Local persistence happens under the state lock so the durable
    /// cache is written in live-state order even when the reconciler races a
    /// commit. Persistence and mirror propagation failures are logged and
    /// never rolled back; the in-memory state is authoritative for this
    /// client from the moment the lock is released.
    pub fn commit(&self, mut next: MasterState) -> MasterState {
        {
            let mut live = self.live.write().expect("state lock poisoned");
            next.timestamp = now_ms().max(live.timestamp + 1);
            *live = next.clone();
            if let Err(e) = self.local.save_snapshot(&next) {
                warn!("failed to persist snapshot locally: {e}");
            }
        }

        if let Some(mirror) = &self.mirror {
            let mirror = Arc::clone(mirror);
            let stamped = next.clone();
            std::thread::spawn(move || {
                if let Err(e) = mirror.publish(&stamped) {
                    // Fire-and-forget: clients may diverge until the next
                    // successful remote write.
                    warn!(timestamp = stamped.timestamp, "mirror publish failed: {e}");
                }
            });
        }

        next
    }

    /// Adopt a remote snapshot verbatim: replace live state and persist it
    /// locally without restamping or republishing. Republishing here would
    /// echo the document straight back to the mirror.
    ///
    /// The strictly-newer guard is re-checked under the write lock: a commit
    /// can land between the reconciler's fetch and this call, and adopting
    /// the now-stale document would roll the live stamp backwards and discard
    /// that commit. Returns whether the snapshot was adopted.
    pub(crate) fn adopt(&self, remote: MasterState) -> bool {
        let mut live = self.live.write().expect("state lock poisoned");
        if remote.timestamp <= live.timestamp {
            debug!(
                remote = remote.timestamp,
                local = live.timestamp,
                "skipping adoption of remote snapshot no longer newer"
            );
            return false;
        }

        info!(timestamp = remote.timestamp, "adopting remote snapshot");
        *live = remote.clone();
        if let Err(e) = self.local.save_snapshot(&remote) {
            warn!("failed to persist adopted snapshot: {e}");
        }
        true
    }

    /// What the durable cache currently holds, for test assertions.
    #[cfg(test)]
    pub(crate) fn persisted_snapshot(&self) -> Option<MasterState> {
        self.local.load_snapshot().expect("load persisted snapshot")
    }

    // -----------------------------------------------------------------------
    // Session identity
    // -----------------------------------------------------------------------

    pub fn session(&self) -> Option<User> {
        self.session.read().expect("session lock poisoned").clone()
    }

    pub(crate) fn set_session(&self, user: User) {
        if let Err(e) = self.local.save_session(&user) {
            warn!("failed to persist session identity: {e}");
        }
        *self.session.write().expect("session lock poisoned") = Some(user);
    }

    pub(crate) fn clear_session(&self) {
        if let Err(e) = self.local.clear_session() {
            warn!("failed to clear persisted session identity: {e}");
        }
        *self.session.write().expect("session lock poisoned") = None;
    }

    // -----------------------------------------------------------------------
    // Session cart (bypasses the mutation gateway, never replicated)
    // -----------------------------------------------------------------------

    pub fn cart(&self) -> Vec<CartItem> {
        self.cart.read().expect("cart lock poisoned").clone()
    }

    /// Add a line to the cart. An item id already present has its quantity
    /// incremented instead of gaining a duplicate row.
    pub fn cart_add(&self, mut item: CartItem) {
        let mut cart = self.cart.write().expect("cart lock poisoned");
        match cart.iter_mut().find(|line| line.item_id == item.item_id) {
            Some(line) => line.quantity += item.quantity.max(1),
            None => {
                // A cart line always carries at least one unit.
                item.quantity = item.quantity.max(1);
                cart.push(item);
            }
        }
    }

    pub fn cart_remove(&self, item_id: &str) {
        let mut cart = self.cart.write().expect("cart lock poisoned");
        cart.retain(|line| line.item_id != item_id);
    }

    pub fn cart_clear(&self) {
        self.cart.write().expect("cart lock poisoned").clear();
    }
}
