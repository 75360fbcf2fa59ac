//! Sync journal: pending mutation queue and sync/transfer bookkeeping.
//!
//! Nothing here talks to a server. The journal only remembers which local
//! mutations would need reconciling and when the store was last synced,
//! exported and imported.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::probe::ConnectivityProbe;
use crate::error::Result;
use crate::models::{RecordSnapshot, SyncAction, SyncEvent};
use crate::storage::{
    Collection, KeyValueStore, DEVICE_ID_KEY, LAST_EXPORT_KEY, LAST_IMPORT_KEY, LAST_SYNC_KEY,
    SYNC_QUEUE_KEY,
};
use crate::util::{format_timestamp, parse_timestamp};

/// Snapshot of journal state for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub last_sync: Option<DateTime<Utc>>,
    pub is_online: bool,
    pub pending_changes: usize,
    pub last_export: Option<DateTime<Utc>>,
    pub last_import: Option<DateTime<Utc>>,
}

/// Outcome of [`SyncJournal::drain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    /// Number of events cleared from the queue
    pub processed: usize,
    /// `last_sync` after the drain; unchanged when nothing was pending
    pub last_sync: Option<DateTime<Utc>>,
}

/// Persistent queue of pending mutation events
pub struct SyncJournal<S> {
    store: Arc<S>,
    queue: Collection<S, SyncEvent>,
    probe: Arc<dyn ConnectivityProbe>,
}

impl<S: KeyValueStore> SyncJournal<S> {
    pub fn new(store: Arc<S>, probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            queue: Collection::new(Arc::clone(&store), SYNC_QUEUE_KEY),
            store,
            probe,
        }
    }

    /// Append an event to the queue
    pub async fn enqueue(&self, event: SyncEvent) -> Result<()> {
        self.queue
            .mutate(|events| {
                events.push(event);
                Some(())
            })
            .await?;
        Ok(())
    }

    /// Enqueue an event for `record`, logging instead of failing.
    ///
    /// CRUD paths use this so an unavailable journal never blocks a mutation.
    pub async fn record(&self, action: SyncAction, record: RecordSnapshot) {
        let kind = record.kind();
        let id = record.id().clone();
        if let Err(error) = self.enqueue(SyncEvent::new(action, record)).await {
            tracing::warn!(
                "Failed to journal {:?} of {} {}: {}",
                action,
                kind.as_str(),
                id,
                error
            );
        }
    }

    /// Events waiting to be reconciled, oldest first
    pub async fn pending(&self) -> Result<Vec<SyncEvent>> {
        self.queue.load().await
    }

    /// Mark every pending event as processed.
    ///
    /// All-or-nothing: `last_sync` is stamped before the queue is cleared,
    /// so a failure leaves every event queued.
    pub async fn drain(&self) -> Result<DrainReport> {
        let _guard = self.queue.lock().await;
        let events = self.queue.load().await?;

        if events.is_empty() {
            return Ok(DrainReport {
                processed: 0,
                last_sync: self.read_timestamp(LAST_SYNC_KEY).await?,
            });
        }

        let now = Utc::now();
        self.store
            .set(LAST_SYNC_KEY, &format_timestamp(now))
            .await?;
        self.queue.save(&[]).await?;

        tracing::info!("Drained {} pending sync events", events.len());
        Ok(DrainReport {
            processed: events.len(),
            last_sync: Some(now),
        })
    }

    /// Current journal state plus a connectivity check
    pub async fn status(&self) -> Result<SyncStatus> {
        let pending_changes = self.queue.load().await?.len();
        let last_sync = self.read_timestamp(LAST_SYNC_KEY).await?;
        let last_export = self.read_timestamp(LAST_EXPORT_KEY).await?;
        let last_import = self.read_timestamp(LAST_IMPORT_KEY).await?;
        let is_online = self.probe.is_online().await;

        Ok(SyncStatus {
            last_sync,
            is_online,
            pending_changes,
            last_export,
            last_import,
        })
    }

    /// Stable opaque id for this installation, created on first use
    pub async fn device_id(&self) -> Result<String> {
        if let Some(existing) = self.store.get(DEVICE_ID_KEY).await? {
            if !existing.trim().is_empty() {
                return Ok(existing);
            }
        }

        let device_id = format!("device-{}", Uuid::new_v4().simple());
        self.store.set(DEVICE_ID_KEY, &device_id).await?;
        tracing::info!("Generated device id {device_id}");
        Ok(device_id)
    }

    /// Stamp the last export time
    pub async fn mark_exported(&self) -> Result<DateTime<Utc>> {
        self.stamp(LAST_EXPORT_KEY).await
    }

    /// Stamp the last import time
    pub async fn mark_imported(&self) -> Result<DateTime<Utc>> {
        self.stamp(LAST_IMPORT_KEY).await
    }

    async fn stamp(&self, key: &str) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        self.store.set(key, &format_timestamp(now)).await?;
        Ok(now)
    }

    async fn read_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            tracing::warn!("Ignoring unparsable timestamp under '{key}': {raw}");
        }
        Ok(parsed)
    }
}
