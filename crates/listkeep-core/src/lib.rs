//! listkeep-core - Core library for Listkeep
//!
//! Local-first persistence for lists and notes: CRUD over a key-value store,
//! a soft-delete trash with 30-day retention, a journal of pending sync
//! events, and whole-store export/import including a best-effort parser for
//! foreign text. Hosts build one [`AppContext`] and share it.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod transfer;
pub mod util;

pub use config::{parse_config, CoreConfig};
pub use context::AppContext;
pub use error::{Error, Result};
pub use models::{List, Note, RecordId};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
