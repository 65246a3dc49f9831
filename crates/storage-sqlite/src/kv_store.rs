//! Durable key-value store backing the persisted account.

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use smartpower_core::account::KeyValueStore;
use smartpower_core::Result;

use crate::errors::StorageError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (unixepoch())
);
"#;

/// One `kv` table behind a single connection.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(StorageError::from)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(StorageError::from)?;
        info!("[Storage] Opened {}", path.display());
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(StorageError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::result::Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;
        Ok(value)
    }

    fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = unixepoch()",
            params![key, value],
        )
        .map_err(StorageError::from)?;
        debug!("[Storage] Set {}", key);
        Ok(())
    }

    fn delete_value(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpower_core::account::{AccountRepository, AccountState};
    use smartpower_core::plans::PlanTier;
    use std::sync::Arc;

    #[test]
    fn set_overwrites_and_delete_removes() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        assert_eq!(store.get_value("selectedPlan").unwrap(), None);

        store.set_value("selectedPlan", "Basic").unwrap();
        store.set_value("selectedPlan", "Premium").unwrap();
        assert_eq!(
            store.get_value("selectedPlan").unwrap().as_deref(),
            Some("Premium")
        );

        store.delete_value("selectedPlan").unwrap();
        assert_eq!(store.get_value("selectedPlan").unwrap(), None);
        store.delete_value("selectedPlan").unwrap();
    }

    #[test]
    fn account_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartpower.db");

        {
            let store = Arc::new(SqliteKeyValueStore::open(&path).unwrap());
            let repo = AccountRepository::new(store);
            let account = AccountState::new("user-42", PlanTier::Standard)
                .with_email(Some("asha@example.com".to_string()));
            repo.save(&account).unwrap();
        }

        let store = Arc::new(SqliteKeyValueStore::open(&path).unwrap());
        assert_eq!(
            store.get_value("planLimit").unwrap().as_deref(),
            Some("200")
        );
        let loaded = AccountRepository::new(store).load().unwrap().unwrap();
        assert_eq!(loaded.user_id(), "user-42");
        assert_eq!(loaded.selected_plan(), PlanTier::Standard);
        assert_eq!(loaded.user_email(), Some("asha@example.com"));
    }
}
