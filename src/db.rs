//! Local SQLite persistence for Platefront.
//!
//! Uses rusqlite with WAL mode. The store is deliberately tiny: a single
//! `app_state` key-value table holding two documents, the serialized
//! `MasterState` snapshot and the serialized active-user identity. Both are
//! written whole on every change; there is no per-entity schema.

use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::models::{MasterState, User};

/// Key under which the full state snapshot is stored.
const KEY_SNAPSHOT: &str = "master_state";
/// Key under which the logged-in identity is stored.
const KEY_SESSION: &str = "active_user";

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Durable key-value store scoped to this client.
pub struct LocalStore {
    conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

impl LocalStore {
    /// Open (or create) the database at `{data_dir}/platefront.db`.
    ///
    /// Creates the directory if needed, opens the connection, sets pragmas,
    /// and runs any pending migrations. On corruption or open failure,
    /// deletes the file and retries once.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("platefront.db");
        info!("opening local store at {}", db_path.display());

        let conn = match open_and_configure(&db_path) {
            Ok(c) => c,
            Err(first_err) => {
                warn!("local store open failed ({first_err}), deleting and retrying once");
                if db_path.exists() {
                    let _ = fs::remove_file(&db_path);
                    let _ = fs::remove_file(db_path.with_extension("db-wal"));
                    let _ = fs::remove_file(db_path.with_extension("db-shm"));
                }
                open_and_configure(&db_path)?
            }
        };

        run_migrations(&conn)?;
        info!("local store ready (schema v{CURRENT_SCHEMA_VERSION})");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    // -----------------------------------------------------------------------
    // Key-value primitives
    // -----------------------------------------------------------------------

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().expect("local store lock poisoned");
        let value = conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("local store lock poisoned");
        conn.execute(
            "INSERT INTO app_state (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("local store lock poisoned");
        conn.execute("DELETE FROM app_state WHERE key = ?1", params![key])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Snapshot and session documents
    // -----------------------------------------------------------------------

    /// Load the last persisted snapshot. A corrupt stored document is logged
    /// and treated as absent so startup can fall back to the seed snapshot.
    pub fn load_snapshot(&self) -> Result<Option<MasterState>, StoreError> {
        let raw = match self.get(KEY_SNAPSHOT)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str::<MasterState>(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("stored snapshot is corrupt ({e}), discarding");
                Ok(None)
            }
        }
    }

    pub fn save_snapshot(&self, state: &MasterState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        self.set(KEY_SNAPSHOT, &raw)
    }

    /// Load the persisted session identity, if any.
    pub fn load_session(&self) -> Result<Option<User>, StoreError> {
        let raw = match self.get(KEY_SESSION)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("stored session identity is corrupt ({e}), discarding");
                Ok(None)
            }
        }
    }

    pub fn save_session(&self, user: &User) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user)?;
        self.set(KEY_SESSION, &raw)
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.delete(KEY_SESSION)
    }
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Migration v1: the app_state key-value table.
fn migrate_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT DEFAULT (datetime('now'))
        );",
    )?;
    conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MasterState, Role};

    #[test]
    fn snapshot_round_trips_field_for_field() {
        let store = LocalStore::open_in_memory().expect("open");
        let state = MasterState::seed();

        store.save_snapshot(&state).expect("save");
        let loaded = store.load_snapshot().expect("load").expect("present");
        assert_eq!(state, loaded);
    }

    #[test]
    fn missing_snapshot_loads_as_none() {
        let store = LocalStore::open_in_memory().expect("open");
        assert!(store.load_snapshot().expect("load").is_none());
    }

    #[test]
    fn corrupt_snapshot_is_discarded_not_fatal() {
        let store = LocalStore::open_in_memory().expect("open");
        store.set(KEY_SNAPSHOT, "{not json").expect("set");
        assert!(store.load_snapshot().expect("load").is_none());
    }

    #[test]
    fn session_identity_persists_and_clears() {
        let store = LocalStore::open_in_memory().expect("open");
        let user = crate::models::User::seed_admin();

        store.save_session(&user).expect("save");
        let loaded = store.load_session().expect("load").expect("present");
        assert_eq!(loaded.role, Role::Admin);
        assert_eq!(loaded.identifier, user.identifier);

        store.clear_session().expect("clear");
        assert!(store.load_session().expect("load").is_none());
    }
}
