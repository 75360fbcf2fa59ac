//! `SQLite`-backed key-value store

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::{migrations, KeyValueStore};
use crate::error::Result;

/// Durable key-value store kept in a single local `SQLite` file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a store at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        migrations::run(&conn)?;
        tracing::debug!("Opened key-value store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Configure `SQLite` for a single local writer
    fn configure(conn: &Connection) -> Result<()> {
        // In-memory databases refuse WAL; that is fine
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_get_remove_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.set("lists", "[]").await.unwrap();
        store.set("lists", "[1]").await.unwrap();
        assert_eq!(store.get("lists").await.unwrap().as_deref(), Some("[1]"));

        store.remove("lists").await.unwrap();
        assert_eq!(store.get("lists").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("listkeep.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("device_id", "device-abc").await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("device_id").await.unwrap().as_deref(),
            Some("device-abc")
        );
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), None);
    }
}
