//! Services over the key-value store: records, trash and the sync journal

mod journal;
mod probe;
mod records;
mod trash;

pub use journal::{DrainReport, SyncJournal, SyncStatus};
pub use probe::{ConnectivityProbe, HttpProbe, ProbeFuture, StaticProbe};
pub use records::{RecordStore, Upserted, DUPLICATE_SUFFIX};
pub use trash::{is_expired, TrashBin, TRASH_RETENTION_DAYS};
