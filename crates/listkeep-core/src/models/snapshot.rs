//! Record snapshots carried by trash entries and sync events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{List, Note, RecordId};

/// Which top-level collection a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    List,
    Note,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Note => "note",
        }
    }
}

/// Full copy of a top-level record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSnapshot {
    List(List),
    Note(Note),
}

impl RecordSnapshot {
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::List(_) => RecordKind::List,
            Self::Note(_) => RecordKind::Note,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &RecordId {
        match self {
            Self::List(list) => &list.id,
            Self::Note(note) => &note.id,
        }
    }

    /// List name or note title
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::List(list) => &list.name,
            Self::Note(note) => &note.title,
        }
    }

    fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::List(list) => serde_json::to_value(list),
            Self::Note(note) => serde_json::to_value(note),
        }
    }

    fn from_value(kind: RecordKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            RecordKind::List => Self::List(serde_json::from_value(value)?),
            RecordKind::Note => Self::Note(serde_json::from_value(value)?),
        })
    }
}

/// A soft-deleted record waiting in the trash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrashEntry", into = "RawTrashEntry")]
pub struct TrashEntry {
    pub id: RecordId,
    pub record: RecordSnapshot,
    /// Stored verbatim; an unparsable value marks the entry as expired
    pub deleted_at: String,
}

impl TrashEntry {
    #[must_use]
    pub fn new(record: RecordSnapshot, deleted_at: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            record,
            deleted_at: crate::util::format_timestamp(deleted_at),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.record.kind()
    }

    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        crate::util::parse_timestamp(&self.deleted_at)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrashEntry {
    id: RecordId,
    kind: RecordKind,
    payload: serde_json::Value,
    deleted_at: String,
}

impl TryFrom<RawTrashEntry> for TrashEntry {
    type Error = serde_json::Error;

    fn try_from(raw: RawTrashEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            record: RecordSnapshot::from_value(raw.kind, raw.payload)?,
            deleted_at: raw.deleted_at,
        })
    }
}

impl From<TrashEntry> for RawTrashEntry {
    fn from(entry: TrashEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.record.kind(),
            payload: entry
                .record
                .to_value()
                .unwrap_or(serde_json::Value::Null),
            deleted_at: entry.deleted_at,
        }
    }
}

/// Kind of mutation recorded in the sync journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

/// One pending mutation awaiting reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSyncEvent", into = "RawSyncEvent")]
pub struct SyncEvent {
    pub action: SyncAction,
    pub record: RecordSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl SyncEvent {
    #[must_use]
    pub fn new(action: SyncAction, record: RecordSnapshot) -> Self {
        Self {
            action,
            record,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSyncEvent {
    kind: SyncAction,
    entity_kind: RecordKind,
    data: serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawSyncEvent> for SyncEvent {
    type Error = serde_json::Error;

    fn try_from(raw: RawSyncEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            action: raw.kind,
            record: RecordSnapshot::from_value(raw.entity_kind, raw.data)?,
            timestamp: raw.timestamp,
        })
    }
}

impl From<SyncEvent> for RawSyncEvent {
    fn from(event: SyncEvent) -> Self {
        Self {
            kind: event.action,
            entity_kind: event.record.kind(),
            data: event.record.to_value().unwrap_or(serde_json::Value::Null),
            timestamp: event.timestamp,
        }
    }
}
