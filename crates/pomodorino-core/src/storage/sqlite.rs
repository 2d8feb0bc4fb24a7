//! SQLite-backed key-value store.
//!
//! A single `kv` table at `<data_dir>/pomodorino.db`. Values are stored as
//! JSON text so every key in the flat layout round-trips losslessly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde_json::Value;

use super::{data_dir, Store};
use crate::error::StoreError;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and create if needed) the store in the data directory.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Self::open_at(dir.join("pomodorino.db"))
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Store for SqliteStore {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut out = HashMap::with_capacity(keys.len());
        for key in keys {
            let row = stmt.query_row(params![key], |row| row.get::<_, String>(0));
            match row {
                Ok(text) => {
                    let value =
                        serde_json::from_str(&text).map_err(|e| StoreError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?;
                    out.insert(key.to_string(), value);
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }

    fn set(&self, entries: &[(&str, Value)]) -> Result<(), StoreError> {
        let conn = self.lock();
        for (key, value) in entries {
            let text = value.to_string();
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, text],
            )?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.lock().execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.get(&["secondsRemaining"]).unwrap().is_empty());

        store
            .set(&[("secondsRemaining", json!(1500)), ("isActive", json!(true))])
            .unwrap();
        let got = store.get(&["secondsRemaining", "isActive", "phase"]).unwrap();
        assert_eq!(got["secondsRemaining"], json!(1500));
        assert_eq!(got["isActive"], json!(true));
        assert!(!got.contains_key("phase"));
    }

    #[test]
    fn overwrite_replaces_value() {
        let store = SqliteStore::open_memory().unwrap();
        store.set(&[("phase", json!("focus"))]).unwrap();
        store.set(&[("phase", json!("break"))]).unwrap();
        assert_eq!(store.get(&["phase"]).unwrap()["phase"], json!("break"));
    }

    #[test]
    fn clear_empties_the_store() {
        let store = SqliteStore::open_memory().unwrap();
        store.set(&[("soundOff", json!(false))]).unwrap();
        store.clear().unwrap();
        assert!(store.get(&["soundOff"]).unwrap().is_empty());
    }

    #[test]
    fn opens_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_at(dir.path().join("kv.db")).unwrap();
        store.set(&[("completedFocusCount", json!(3))]).unwrap();
        drop(store);

        let store = SqliteStore::open_at(dir.path().join("kv.db")).unwrap();
        assert_eq!(
            store.get(&["completedFocusCount"]).unwrap()["completedFocusCount"],
            json!(3)
        );
    }
}
