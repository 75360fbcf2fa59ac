//! Behavior shared by the two top-level record families

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{List, ListDraft, Note, NoteDraft, RecordId, RecordKind, RecordSnapshot};

/// A top-level aggregate stored as one element of a collection
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Fields a caller supplies to create one
    type Draft;

    const KIND: RecordKind;

    fn id(&self) -> &RecordId;

    fn set_id(&mut self, id: RecordId);

    /// List name or note title; the key used when importing
    fn label(&self) -> &str;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Refresh `updated_at` without moving it backwards
    fn touch(&mut self);

    fn into_snapshot(self) -> RecordSnapshot;

    /// Materialize a draft with a fresh id and timestamps
    fn from_draft(draft: Self::Draft) -> Self;

    /// Replace every content field with `draft`'s, keeping identity
    fn overwrite_with(&mut self, draft: Self::Draft);
}

impl Record for List {
    type Draft = ListDraft;

    const KIND: RecordKind = RecordKind::List;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        Self::touch(self);
    }

    fn into_snapshot(self) -> RecordSnapshot {
        RecordSnapshot::List(self)
    }

    fn from_draft(draft: ListDraft) -> Self {
        draft.into_list()
    }

    fn overwrite_with(&mut self, draft: ListDraft) {
        let mut replacement = draft.into_list();
        replacement.id = self.id.clone();
        replacement.created_at = self.created_at;
        replacement.updated_at = self.updated_at;
        *self = replacement;
        Self::touch(self);
    }
}

impl Record for Note {
    type Draft = NoteDraft;

    const KIND: RecordKind = RecordKind::Note;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        Self::touch(self);
    }

    fn into_snapshot(self) -> RecordSnapshot {
        RecordSnapshot::Note(self)
    }

    fn from_draft(draft: NoteDraft) -> Self {
        draft.into_note()
    }

    fn overwrite_with(&mut self, draft: NoteDraft) {
        let mut replacement = draft.into_note();
        replacement.id = self.id.clone();
        replacement.created_at = self.created_at;
        replacement.updated_at = self.updated_at;
        *self = replacement;
        Self::touch(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;

    #[test]
    fn overwrite_keeps_identity_and_replaces_content() {
        let mut list = ListDraft {
            description: Some("antiga".to_string()),
            ..ListDraft::new("Compras")
        }
        .into_list();
        let id = list.id.clone();
        let created_at = list.created_at;

        let mut draft = ListDraft::new("Compras");
        draft.items = vec![Item::new("Leite")];
        list.overwrite_with(draft);

        assert_eq!(list.id, id);
        assert_eq!(list.created_at, created_at);
        assert_eq!(list.description, None);
        assert_eq!(list.items.len(), 1);
        assert!(list.updated_at >= created_at);
    }

    #[test]
    fn note_label_is_title() {
        let note = Note::from_draft(NoteDraft::new("Ideias", "x"));
        assert_eq!(note.label(), "Ideias");
        assert_eq!(Note::KIND, RecordKind::Note);
    }
}
