//! Data models for Listkeep

mod id;
mod list;
mod note;
mod record;
mod snapshot;

pub use id::RecordId;
pub use list::{
    AnimationKind, Category, CategoryPatch, Item, ItemDraft, ItemPatch, List, ListDraft,
    ListPatch, StyledRun,
};
pub use note::{Note, NoteDraft, NotePatch};
pub use record::Record;
pub use snapshot::{RecordKind, RecordSnapshot, SyncAction, SyncEvent, TrashEntry};
