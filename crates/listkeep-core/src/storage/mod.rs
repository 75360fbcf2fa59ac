//! Key-value persistence.
//!
//! Everything the core persists goes through [`KeyValueStore`]: string keys,
//! string values, no multi-key transactions. Collections of records are one
//! JSON array per key, read and written whole by [`Collection`].

mod collection;
mod memory;
mod migrations;
mod sqlite;

pub use collection::Collection;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;

/// Storage key for the list collection
pub const LISTS_KEY: &str = "lists";
/// Storage key for the note collection
pub const NOTES_KEY: &str = "notes";
/// Storage key for trash entries
pub const TRASH_KEY: &str = "trash";
/// Storage key for the pending sync events
pub const SYNC_QUEUE_KEY: &str = "sync_queue";
/// Storage key for the persisted device id
pub const DEVICE_ID_KEY: &str = "device_id";
/// Storage key for the last successful drain timestamp
pub const LAST_SYNC_KEY: &str = "last_sync";
/// Storage key for the last export timestamp
pub const LAST_EXPORT_KEY: &str = "last_export";
/// Storage key for the last import timestamp
pub const LAST_IMPORT_KEY: &str = "last_import";
/// Storage key for an in-flight trash restore
pub const PENDING_RESTORE_KEY: &str = "trash_pending_restore";

/// Durable asynchronous string-keyed storage
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key
    async fn clear(&self) -> Result<()>;
}
