//! One JSON array of records under one storage key

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use super::KeyValueStore;
use crate::error::Result;
use crate::util::compact_text;

/// Whole-collection persistence for one record type.
///
/// Every write replaces the full array. Read-modify-write cycles started
/// through [`Collection::mutate`] are serialized by a per-key lock, so two
/// mutations of the same key inside one process cannot lose each other's
/// changes. Share one `Collection` per key between every component that
/// writes it.
pub struct Collection<S, T> {
    store: Arc<S>,
    key: &'static str,
    write_lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<S, T> Collection<S, T>
where
    S: KeyValueStore,
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<S>, key: &'static str) -> Self {
        Self {
            store,
            key,
            write_lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    /// Read all records.
    ///
    /// A missing key or a value that is not a JSON array yields an empty
    /// collection. Elements are decoded one by one; an element that does not
    /// decode is skipped with a warning and its siblings are kept. Only a
    /// failing store read is an error.
    pub async fn load(&self) -> Result<Vec<T>> {
        let Some(raw) = self.store.get(self.key).await? else {
            return Ok(Vec::new());
        };

        let values = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => values,
            Err(error) => {
                tracing::warn!(
                    "Ignoring corrupt data under '{}': {} ({})",
                    self.key,
                    error,
                    compact_text(&raw)
                );
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<T>(value) {
                Ok(record) => records.push(record),
                Err(error) => tracing::warn!(
                    "Skipping unreadable record {} under '{}': {}",
                    index,
                    self.key,
                    error
                ),
            }
        }
        Ok(records)
    }

    /// Replace the stored array
    pub async fn save(&self, records: &[T]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.store.set(self.key, &raw).await?;
        tracing::debug!("Persisted {} records under '{}'", records.len(), self.key);
        Ok(())
    }

    /// Hold the write lock across a manual `load`/`save` pair.
    ///
    /// Do not call [`Collection::mutate`] while holding the guard.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Read, modify and unconditionally write the collection as one step
    pub async fn update<R>(&self, apply: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let result = apply(&mut records);
        self.save(&records).await?;
        Ok(result)
    }

    /// Read, modify and write the collection as one step.
    ///
    /// `apply` returns `None` when it changed nothing; the collection is then
    /// left unwritten and `None` is returned.
    pub async fn mutate<R>(
        &self,
        apply: impl FnOnce(&mut Vec<T>) -> Option<R>,
    ) -> Result<Option<R>> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let Some(result) = apply(&mut records) else {
            return Ok(None);
        };
        self.save(&records).await?;
        Ok(Some(result))
    }
}
