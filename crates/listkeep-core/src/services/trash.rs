//! Trash: soft-deleted records kept for a fixed retention window.
//!
//! Expired entries are purged lazily, on every read. Restores go through a
//! write-ahead marker so a crash between the live write and the trash
//! removal is reconciled on the next read instead of leaving the record in
//! both places.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::journal::SyncJournal;
use crate::error::Result;
use crate::models::{
    List, Note, Record, RecordId, RecordKind, RecordSnapshot, SyncAction, TrashEntry,
};
use crate::storage::{Collection, KeyValueStore, PENDING_RESTORE_KEY, TRASH_KEY};

/// Days a trashed record survives before it is purged
pub const TRASH_RETENTION_DAYS: i64 = 30;

/// Whether `entry` is past retention at `now`; unparsable timestamps count as expired
pub fn is_expired(entry: &TrashEntry, now: DateTime<Utc>) -> bool {
    entry
        .deleted_at()
        .map_or(true, |deleted_at| {
            now.signed_duration_since(deleted_at) >= Duration::days(TRASH_RETENTION_DAYS)
        })
}

/// Restore that has started but not yet removed its trash entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingRestore {
    entry_id: RecordId,
    kind: RecordKind,
    restored_id: RecordId,
}

/// Soft-delete holding area
pub struct TrashBin<S> {
    store: Arc<S>,
    entries: Collection<S, TrashEntry>,
    lists: Arc<Collection<S, List>>,
    notes: Arc<Collection<S, Note>>,
    journal: Arc<SyncJournal<S>>,
}

impl<S: KeyValueStore> TrashBin<S> {
    pub fn new(
        store: Arc<S>,
        lists: Arc<Collection<S, List>>,
        notes: Arc<Collection<S, Note>>,
        journal: Arc<SyncJournal<S>>,
    ) -> Self {
        Self {
            entries: Collection::new(Arc::clone(&store), TRASH_KEY),
            store,
            lists,
            notes,
            journal,
        }
    }

    /// Drop expired entries and return how many were removed
    pub async fn purge_expired(&self) -> Result<usize> {
        let _guard = self.entries.lock().await;
        let (_, purged) = self.load_current().await?;
        Ok(purged)
    }

    /// Live trash entries, most recently deleted first
    pub async fn list(&self) -> Result<Vec<TrashEntry>> {
        let _guard = self.entries.lock().await;
        let (mut entries, _) = self.load_current().await?;
        entries.sort_by(|a, b| b.deleted_at().cmp(&a.deleted_at()));
        Ok(entries)
    }

    /// Move a snapshot into the trash
    pub async fn insert(&self, record: RecordSnapshot) -> Result<TrashEntry> {
        let entry = TrashEntry::new(record, Utc::now());
        let inserted = entry.clone();
        self.entries
            .update(move |entries| entries.insert(0, entry))
            .await?;
        tracing::info!(
            "Moved {} {} to trash",
            inserted.kind().as_str(),
            inserted.record.id()
        );
        Ok(inserted)
    }

    /// Put a trashed record back into its live collection.
    ///
    /// Returns the restored record, or `None` when no live entry has `id`.
    /// The id is regenerated when it collides with a live record. The live
    /// write happens before the trash entry is removed.
    pub async fn restore(&self, id: &RecordId) -> Result<Option<RecordSnapshot>> {
        let _guard = self.entries.lock().await;
        let (mut entries, _) = self.load_current().await?;
        let Some(position) = entries.iter().position(|entry| &entry.id == id) else {
            return Ok(None);
        };
        let entry = entries[position].clone();

        let restored = match entry.record {
            RecordSnapshot::List(list) => {
                self.restore_into(&self.lists, &entry.id, list).await?
            }
            RecordSnapshot::Note(note) => {
                self.restore_into(&self.notes, &entry.id, note).await?
            }
        };

        self.journal
            .record(SyncAction::Create, restored.clone())
            .await;

        entries.remove(position);
        self.entries.save(&entries).await?;
        if let Err(error) = self.store.remove(PENDING_RESTORE_KEY).await {
            tracing::warn!("Failed to clear pending restore marker: {error}");
        }

        tracing::info!("Restored {} {}", restored.kind().as_str(), restored.id());
        Ok(Some(restored))
    }

    /// Permanently remove one live entry
    pub async fn delete_forever(&self, id: &RecordId) -> Result<bool> {
        let _guard = self.entries.lock().await;
        let (mut entries, _) = self.load_current().await?;
        let Some(position) = entries.iter().position(|entry| &entry.id == id) else {
            return Ok(false);
        };
        entries.remove(position);
        self.entries.save(&entries).await?;
        Ok(true)
    }

    /// Permanently remove every entry, returning how many live ones there were
    pub async fn empty(&self) -> Result<usize> {
        let _guard = self.entries.lock().await;
        let (entries, _) = self.load_current().await?;
        let count = entries.len();
        self.entries.save(&[]).await?;
        tracing::info!("Emptied trash ({count} entries)");
        Ok(count)
    }

    async fn restore_into<T: Record>(
        &self,
        live: &Collection<S, T>,
        entry_id: &RecordId,
        mut record: T,
    ) -> Result<RecordSnapshot> {
        let collides = live
            .load()
            .await?
            .iter()
            .any(|existing| existing.id() == record.id());
        if collides {
            record.set_id(RecordId::new());
            record.touch();
        }

        let marker = PendingRestore {
            entry_id: entry_id.clone(),
            kind: T::KIND,
            restored_id: record.id().clone(),
        };
        self.store
            .set(PENDING_RESTORE_KEY, &serde_json::to_string(&marker)?)
            .await?;

        let restored = live
            .update(move |records| {
                if records.iter().any(|existing| existing.id() == record.id()) {
                    record.set_id(RecordId::new());
                    record.touch();
                }
                records.push(record.clone());
                record
            })
            .await?;
        Ok(restored.into_snapshot())
    }

    /// Load entries, finish an interrupted restore and drop expired ones.
    ///
    /// Returns the live entries and how many expired ones were purged.
    /// Caller holds the trash lock.
    async fn load_current(&self) -> Result<(Vec<TrashEntry>, usize)> {
        let mut entries = self.entries.load().await?;
        self.reconcile_pending_restore(&mut entries).await?;

        let now = Utc::now();
        let before = entries.len();
        entries.retain(|entry| !is_expired(entry, now));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::info!("Purged {purged} expired trash entries");
            self.entries.save(&entries).await?;
        }
        Ok((entries, purged))
    }

    /// Finish or discard a restore that failed after writing its marker.
    ///
    /// The trash write lands before the marker is cleared.
    async fn reconcile_pending_restore(&self, entries: &mut Vec<TrashEntry>) -> Result<()> {
        let Some(raw) = self.store.get(PENDING_RESTORE_KEY).await? else {
            return Ok(());
        };

        let mut changed = false;
        match serde_json::from_str::<PendingRestore>(&raw) {
            Ok(marker) => {
                let is_live = match marker.kind {
                    RecordKind::List => self
                        .lists
                        .load()
                        .await?
                        .iter()
                        .any(|list| list.id == marker.restored_id),
                    RecordKind::Note => self
                        .notes
                        .load()
                        .await?
                        .iter()
                        .any(|note| note.id == marker.restored_id),
                };
                if is_live {
                    let before = entries.len();
                    entries.retain(|entry| entry.id != marker.entry_id);
                    changed = entries.len() != before;
                    tracing::info!(
                        "Completed interrupted restore of {}",
                        marker.restored_id
                    );
                }
            }
            Err(error) => tracing::warn!("Discarding unreadable restore marker: {error}"),
        }

        if changed {
            self.entries.save(entries).await?;
        }
        self.store.remove(PENDING_RESTORE_KEY).await?;
        Ok(())
    }
}
