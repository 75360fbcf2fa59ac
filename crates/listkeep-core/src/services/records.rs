//! Record store: CRUD over lists and notes.
//!
//! Each collection is one JSON array under one key; every mutation is a
//! full read-modify-write of that key. Missing records are reported through
//! `Option`/`bool`, storage failures through `Err`. List-level and note-level
//! create/update/delete each journal one event; nested item and category
//! edits only refresh the parent list's `updated_at`.

use std::sync::Arc;

use super::journal::SyncJournal;
use super::trash::TrashBin;
use crate::error::Result;
use crate::models::{
    Category, CategoryPatch, Item, ItemDraft, ItemPatch, List, ListDraft, ListPatch, Note,
    NoteDraft, NotePatch, Record, RecordId, SyncAction,
};
use crate::storage::{Collection, KeyValueStore};

/// Suffix appended to the name of a duplicated list or note
pub const DUPLICATE_SUFFIX: &str = " (cópia)";

/// Result of importing a record matched by name
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted<T> {
    /// No record had the same name; a new one was created
    Created(T),
    /// A record with the same name was overwritten in place
    Overwritten(T),
}

impl<T> Upserted<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(record) | Self::Overwritten(record) => record,
        }
    }

    pub const fn is_overwrite(&self) -> bool {
        matches!(self, Self::Overwritten(_))
    }
}

/// CRUD and query operations over the live collections
pub struct RecordStore<S> {
    lists: Arc<Collection<S, List>>,
    notes: Arc<Collection<S, Note>>,
    trash: Arc<TrashBin<S>>,
    journal: Arc<SyncJournal<S>>,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn new(
        lists: Arc<Collection<S, List>>,
        notes: Arc<Collection<S, Note>>,
        trash: Arc<TrashBin<S>>,
        journal: Arc<SyncJournal<S>>,
    ) -> Self {
        Self {
            lists,
            notes,
            trash,
            journal,
        }
    }

    // ----- lists -----

    /// All lists in stored order
    pub async fn load_lists(&self) -> Result<Vec<List>> {
        self.lists.load().await
    }

    pub async fn get_list(&self, id: &RecordId) -> Result<Option<List>> {
        Ok(self
            .lists
            .load()
            .await?
            .into_iter()
            .find(|list| &list.id == id))
    }

    pub async fn create_list(&self, draft: ListDraft) -> Result<List> {
        self.create_record(&self.lists, List::from_draft(draft))
            .await
    }

    pub async fn update_list(&self, id: &RecordId, patch: ListPatch) -> Result<Option<List>> {
        self.update_record(&self.lists, id, |list| patch.apply(list))
            .await
    }

    pub async fn remove_list(&self, id: &RecordId) -> Result<bool> {
        self.remove_record(&self.lists, id).await
    }

    /// Copy a list under a new id; every item gets a fresh id and timestamps
    pub async fn duplicate_list(&self, id: &RecordId) -> Result<Option<List>> {
        let Some(source) = self.get_list(id).await? else {
            return Ok(None);
        };

        let mut draft = ListDraft::from(source);
        draft.name.push_str(DUPLICATE_SUFFIX);
        draft.items = draft.items.iter().map(Item::cloned_fresh).collect();
        self.create_list(draft).await.map(Some)
    }

    /// Case-insensitive substring search over names, descriptions and item
    /// text, most recently updated first
    pub async fn search_lists(&self, query: &str) -> Result<Vec<List>> {
        let mut lists = self.lists.load().await?;
        let needle = query.trim().to_lowercase();
        if !needle.is_empty() {
            lists.retain(|list| {
                list.name.to_lowercase().contains(&needle)
                    || list
                        .description
                        .as_deref()
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                    || list
                        .items
                        .iter()
                        .any(|item| item.text.to_lowercase().contains(&needle))
            });
        }
        lists.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(lists)
    }

    /// Overwrite the list named like `draft`, or create it
    pub async fn upsert_list_by_name(&self, draft: ListDraft) -> Result<Upserted<List>> {
        self.upsert_by_label(&self.lists, draft.name.clone(), draft)
            .await
    }

    // ----- items -----

    pub async fn add_item(&self, list_id: &RecordId, draft: ItemDraft) -> Result<Option<Item>> {
        self.lists
            .mutate(|lists| {
                let list = lists.iter_mut().find(|list| &list.id == list_id)?;
                let mut item = draft.into_item();
                while list.items.iter().any(|existing| existing.id == item.id) {
                    item.id = RecordId::new();
                }
                list.items.push(item.clone());
                list.touch();
                Some(item)
            })
            .await
    }

    pub async fn update_item(
        &self,
        list_id: &RecordId,
        item_id: &RecordId,
        patch: ItemPatch,
    ) -> Result<Option<Item>> {
        self.lists
            .mutate(|lists| {
                let list = lists.iter_mut().find(|list| &list.id == list_id)?;
                let item = list.items.iter_mut().find(|item| &item.id == item_id)?;
                patch.apply(item);
                let updated = item.clone();
                list.touch();
                Some(updated)
            })
            .await
    }

    /// Flip an item's completion flag
    pub async fn toggle_item(&self, list_id: &RecordId, item_id: &RecordId) -> Result<Option<Item>> {
        self.lists
            .mutate(|lists| {
                let list = lists.iter_mut().find(|list| &list.id == list_id)?;
                let item = list.items.iter_mut().find(|item| &item.id == item_id)?;
                ItemPatch {
                    completed: Some(!item.completed),
                    ..ItemPatch::default()
                }
                .apply(item);
                let updated = item.clone();
                list.touch();
                Some(updated)
            })
            .await
    }

    pub async fn remove_item(&self, list_id: &RecordId, item_id: &RecordId) -> Result<bool> {
        let removed = self
            .lists
            .mutate(|lists| {
                let list = lists.iter_mut().find(|list| &list.id == list_id)?;
                let position = list.items.iter().position(|item| &item.id == item_id)?;
                list.items.remove(position);
                list.touch();
                Some(())
            })
            .await?;
        Ok(removed.is_some())
    }

    // ----- categories -----

    pub async fn add_category(
        &self,
        list_id: &RecordId,
        name: impl Into<String>,
        color: Option<String>,
    ) -> Result<Option<Category>> {
        let mut category = Category::new(name);
        category.color = color;
        self.lists
            .mutate(|lists| {
                let list = lists.iter_mut().find(|list| &list.id == list_id)?;
                while list.categories.iter().any(|existing| existing.id == category.id) {
                    category.id = RecordId::new();
                }
                list.categories.push(category.clone());
                list.touch();
                Some(category)
            })
            .await
    }

    pub async fn update_category(
        &self,
        list_id: &RecordId,
        category_id: &RecordId,
        patch: CategoryPatch,
    ) -> Result<Option<Category>> {
        self.lists
            .mutate(|lists| {
                let list = lists.iter_mut().find(|list| &list.id == list_id)?;
                let category = list
                    .categories
                    .iter_mut()
                    .find(|category| &category.id == category_id)?;
                patch.apply(category);
                let updated = category.clone();
                list.touch();
                Some(updated)
            })
            .await
    }

    /// Remove a category; items that reference it keep the dangling id
    pub async fn remove_category(&self, list_id: &RecordId, category_id: &RecordId) -> Result<bool> {
        let removed = self
            .lists
            .mutate(|lists| {
                let list = lists.iter_mut().find(|list| &list.id == list_id)?;
                let position = list
                    .categories
                    .iter()
                    .position(|category| &category.id == category_id)?;
                list.categories.remove(position);
                list.touch();
                Some(
                    list.items
                        .iter()
                        .filter(|item| item.references_category(category_id))
                        .count(),
                )
            })
            .await?;
        if let Some(orphaned) = removed.filter(|count| *count > 0) {
            tracing::debug!("Removed category {category_id}, {orphaned} items keep its id");
        }
        Ok(removed.is_some())
    }

    // ----- notes -----

    /// All notes in stored order
    pub async fn load_notes(&self) -> Result<Vec<Note>> {
        self.notes.load().await
    }

    pub async fn get_note(&self, id: &RecordId) -> Result<Option<Note>> {
        Ok(self
            .notes
            .load()
            .await?
            .into_iter()
            .find(|note| &note.id == id))
    }

    pub async fn create_note(&self, draft: NoteDraft) -> Result<Note> {
        self.create_record(&self.notes, Note::from_draft(draft))
            .await
    }

    pub async fn update_note(&self, id: &RecordId, patch: NotePatch) -> Result<Option<Note>> {
        self.update_record(&self.notes, id, |note| patch.apply(note))
            .await
    }

    pub async fn remove_note(&self, id: &RecordId) -> Result<bool> {
        self.remove_record(&self.notes, id).await
    }

    pub async fn duplicate_note(&self, id: &RecordId) -> Result<Option<Note>> {
        let Some(source) = self.get_note(id).await? else {
            return Ok(None);
        };

        let mut draft = NoteDraft::from(source);
        draft.title.push_str(DUPLICATE_SUFFIX);
        self.create_note(draft).await.map(Some)
    }

    /// Case-insensitive substring search over titles and plain text, most
    /// recently updated first
    pub async fn search_notes(&self, query: &str) -> Result<Vec<Note>> {
        let mut notes = self.notes.load().await?;
        let needle = query.trim().to_lowercase();
        if !needle.is_empty() {
            notes.retain(|note| {
                note.title.to_lowercase().contains(&needle)
                    || note.plain_text.to_lowercase().contains(&needle)
            });
        }
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    /// Overwrite the note titled like `draft`, or create it
    pub async fn upsert_note_by_title(&self, draft: NoteDraft) -> Result<Upserted<Note>> {
        self.upsert_by_label(&self.notes, draft.title.clone(), draft)
            .await
    }

    // ----- shared -----

    async fn create_record<T: Record>(&self, collection: &Collection<S, T>, record: T) -> Result<T> {
        let created = collection
            .update(move |records| {
                let mut record = record;
                while records.iter().any(|existing| existing.id() == record.id()) {
                    record.set_id(RecordId::new());
                }
                records.push(record.clone());
                record
            })
            .await?;

        tracing::debug!("Created {} {}", T::KIND.as_str(), created.id());
        self.journal
            .record(SyncAction::Create, created.clone().into_snapshot())
            .await;
        Ok(created)
    }

    async fn update_record<T: Record>(
        &self,
        collection: &Collection<S, T>,
        id: &RecordId,
        apply: impl FnOnce(&mut T),
    ) -> Result<Option<T>> {
        let updated = collection
            .mutate(|records| {
                let record = records.iter_mut().find(|record| record.id() == id)?;
                apply(record);
                Some(record.clone())
            })
            .await?;

        if let Some(record) = &updated {
            self.journal
                .record(SyncAction::Update, record.clone().into_snapshot())
                .await;
        }
        Ok(updated)
    }

    async fn remove_record<T: Record>(&self, collection: &Collection<S, T>, id: &RecordId) -> Result<bool> {
        let removed = collection
            .mutate(|records| {
                let position = records.iter().position(|record| record.id() == id)?;
                Some((position, records.remove(position)))
            })
            .await?;
        let Some((position, record)) = removed else {
            return Ok(false);
        };

        if let Err(error) = self.trash.insert(record.clone().into_snapshot()).await {
            tracing::warn!(
                "Trash insert failed for {} {}, putting it back: {}",
                T::KIND.as_str(),
                record.id(),
                error
            );
            collection
                .update(move |records| {
                    let position = position.min(records.len());
                    records.insert(position, record);
                })
                .await?;
            return Err(error);
        }

        self.journal
            .record(SyncAction::Delete, record.into_snapshot())
            .await;
        Ok(true)
    }

    async fn upsert_by_label<T: Record>(
        &self,
        collection: &Collection<S, T>,
        label: String,
        draft: T::Draft,
    ) -> Result<Upserted<T>> {
        let label = label.trim().to_string();
        let upserted = collection
            .update(move |records| {
                if let Some(existing) = records
                    .iter_mut()
                    .find(|record| record.label().trim() == label)
                {
                    existing.overwrite_with(draft);
                    return Upserted::Overwritten(existing.clone());
                }

                let mut record = T::from_draft(draft);
                while records.iter().any(|existing| existing.id() == record.id()) {
                    record.set_id(RecordId::new());
                }
                records.push(record.clone());
                Upserted::Created(record)
            })
            .await?;

        let (action, record) = match &upserted {
            Upserted::Created(record) => (SyncAction::Create, record),
            Upserted::Overwritten(record) => (SyncAction::Update, record),
        };
        self.journal
            .record(action, record.clone().into_snapshot())
            .await;
        Ok(upserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordSnapshot;
    use crate::services::StaticProbe;
    use crate::storage::{MemoryStore, LISTS_KEY, NOTES_KEY, SYNC_QUEUE_KEY, TRASH_KEY};
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: Arc<MemoryStore>,
        journal: Arc<SyncJournal<MemoryStore>>,
        trash: Arc<TrashBin<MemoryStore>>,
        records: RecordStore<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let lists = Arc::new(Collection::new(Arc::clone(&store), LISTS_KEY));
        let notes = Arc::new(Collection::new(Arc::clone(&store), NOTES_KEY));
        let journal = Arc::new(SyncJournal::new(
            Arc::clone(&store),
            Arc::new(StaticProbe(true)),
        ));
        let trash = Arc::new(TrashBin::new(
            Arc::clone(&store),
            Arc::clone(&lists),
            Arc::clone(&notes),
            Arc::clone(&journal),
        ));
        let records = RecordStore::new(lists, notes, Arc::clone(&trash), Arc::clone(&journal));
        Fixture {
            store,
            journal,
            trash,
            records,
        }
    }

    async fn pending(f: &Fixture) -> usize {
        f.journal.pending().await.unwrap().len()
    }

    #[tokio::test]
    async fn create_and_load_lists() {
        let f = fixture();
        let list = f.records.create_list(ListDraft::new("Compras")).await.unwrap();

        assert_eq!(list.created_at, list.updated_at);
        assert_eq!(f.records.load_lists().await.unwrap(), vec![list.clone()]);
        assert_eq!(f.records.get_list(&list.id).await.unwrap(), Some(list));
        assert_eq!(pending(&f).await, 1);
    }

    #[tokio::test]
    async fn create_keeps_legacy_and_unreadable_neighbors_safe() {
        let f = fixture();
        f.store
            .set(
                LISTS_KEY,
                r#"[
                    {"id": "a", "name": "Antiga"},
                    {"id": "b", "name": "Boa", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"},
                    {"id": "c"}
                ]"#,
            )
            .await
            .unwrap();

        f.records.create_list(ListDraft::new("Nova")).await.unwrap();

        let names = f
            .records
            .load_lists()
            .await
            .unwrap()
            .into_iter()
            .map(|list| list.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Antiga", "Boa", "Nova"]);
    }

    #[tokio::test]
    async fn update_missing_list_returns_none() {
        let f = fixture();
        let updated = f
            .records
            .update_list(&RecordId::new(), ListPatch::default())
            .await
            .unwrap();
        assert!(updated.is_none());
        assert_eq!(pending(&f).await, 0);
    }

    #[tokio::test]
    async fn updates_are_shallow_and_monotonic() {
        let f = fixture();
        let list = f
            .records
            .create_list(ListDraft {
                color: Some("#FF0000".to_string()),
                ..ListDraft::new("Compras")
            })
            .await
            .unwrap();

        let mut previous = list.updated_at;
        for name in ["Mercado", "Feira", "Padaria"] {
            let updated = f
                .records
                .update_list(
                    &list.id,
                    ListPatch {
                        name: Some(name.to_string()),
                        ..ListPatch::default()
                    },
                )
                .await
                .unwrap()
                .unwrap();
            assert!(updated.updated_at >= previous);
            assert_eq!(updated.color.as_deref(), Some("#FF0000"));
            previous = updated.updated_at;
        }
        assert_eq!(pending(&f).await, 4);
    }

    #[tokio::test]
    async fn remove_moves_list_to_trash() {
        let f = fixture();
        let list = f.records.create_list(ListDraft::new("Compras")).await.unwrap();

        assert!(f.records.remove_list(&list.id).await.unwrap());
        assert!(!f.records.remove_list(&list.id).await.unwrap());

        assert!(f.records.load_lists().await.unwrap().is_empty());
        let trashed = f.trash.list().await.unwrap();
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].record, RecordSnapshot::List(list));

        let events = f.journal.pending().await.unwrap();
        assert_eq!(events.last().unwrap().action, SyncAction::Delete);
    }

    #[tokio::test]
    async fn failed_trash_insert_keeps_record_live() {
        let f = fixture();
        let first = f.records.create_note(NoteDraft::new("a", "")).await.unwrap();
        let second = f.records.create_note(NoteDraft::new("b", "")).await.unwrap();

        f.store.fail_writes(TRASH_KEY);
        assert!(f.records.remove_note(&first.id).await.is_err());

        let notes = f.records.load_notes().await.unwrap();
        assert_eq!(notes, vec![first, second]);
    }

    #[tokio::test]
    async fn journal_failure_does_not_block_crud() {
        let f = fixture();
        f.store.fail_writes(SYNC_QUEUE_KEY);

        let note = f
            .records
            .create_note(NoteDraft::new("Ideias", "texto"))
            .await
            .unwrap();
        assert!(f.records.remove_note(&note.id).await.unwrap());
        assert_eq!(pending(&f).await, 0);
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let f = fixture();
        f.store.fail_writes(LISTS_KEY);
        assert!(f.records.create_list(ListDraft::new("x")).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_list_refreshes_identity() {
        let f = fixture();
        let list = f.records.create_list(ListDraft::new("Compras")).await.unwrap();
        f.records
            .add_item(&list.id, ItemDraft::new("Leite"))
            .await
            .unwrap();
        let original = f.records.get_list(&list.id).await.unwrap().unwrap();

        let copy = f.records.duplicate_list(&list.id).await.unwrap().unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "Compras (cópia)");
        assert_eq!(copy.items.len(), 1);
        assert_eq!(copy.items[0].text, "Leite");
        assert_ne!(copy.items[0].id, original.items[0].id);
        assert!(copy.created_at >= original.created_at);

        assert!(f
            .records
            .duplicate_list(&RecordId::new())
            .await
            .unwrap()
            .is_none());
        // create + duplicate, nested add_item is not journaled
        assert_eq!(pending(&f).await, 2);
    }

    #[tokio::test]
    async fn nested_item_operations() {
        let f = fixture();
        let list = f.records.create_list(ListDraft::new("Compras")).await.unwrap();

        let item = f
            .records
            .add_item(&list.id, ItemDraft::new("Leite"))
            .await
            .unwrap()
            .unwrap();
        let updated = f
            .records
            .update_item(
                &list.id,
                &item.id,
                ItemPatch {
                    description: Some("integral".to_string()),
                    ..ItemPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("integral"));

        let toggled = f
            .records
            .toggle_item(&list.id, &item.id)
            .await
            .unwrap()
            .unwrap();
        assert!(toggled.completed);

        let stored = f.records.get_list(&list.id).await.unwrap().unwrap();
        assert!(stored.updated_at >= list.updated_at);
        assert_eq!(stored.items, vec![toggled]);

        assert!(f.records.remove_item(&list.id, &item.id).await.unwrap());
        assert!(!f.records.remove_item(&list.id, &item.id).await.unwrap());
        assert!(f
            .records
            .add_item(&RecordId::new(), ItemDraft::new("x"))
            .await
            .unwrap()
            .is_none());
        assert!(f
            .records
            .update_item(&list.id, &RecordId::new(), ItemPatch::default())
            .await
            .unwrap()
            .is_none());
        assert_eq!(pending(&f).await, 1);
    }

    #[tokio::test]
    async fn removing_category_orphans_item_reference() {
        let f = fixture();
        let list = f.records.create_list(ListDraft::new("Compras")).await.unwrap();
        let category = f
            .records
            .add_category(&list.id, "Proteínas", Some("#AA0000".to_string()))
            .await
            .unwrap()
            .unwrap();
        f.records
            .add_item(
                &list.id,
                ItemDraft {
                    category: Some(category.id.clone()),
                    ..ItemDraft::new("Ovos")
                },
            )
            .await
            .unwrap();

        let renamed = f
            .records
            .update_category(
                &list.id,
                &category.id,
                CategoryPatch {
                    name: Some("Proteína".to_string()),
                    ..CategoryPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Proteína");
        assert_eq!(renamed.color.as_deref(), Some("#AA0000"));

        assert!(f
            .records
            .remove_category(&list.id, &category.id)
            .await
            .unwrap());
        let stored = f.records.get_list(&list.id).await.unwrap().unwrap();
        assert!(stored.categories.is_empty());
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].category.as_ref(), Some(&category.id));
    }

    #[tokio::test]
    async fn note_crud_and_search() {
        let f = fixture();
        let groceries = f
            .records
            .create_note(NoteDraft::new("Mercado", "comprar café"))
            .await
            .unwrap();
        f.records
            .create_note(NoteDraft::new("Viagem", "passaporte"))
            .await
            .unwrap();

        let found = f.records.search_notes("CAFÉ").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, groceries.id);
        assert_eq!(f.records.search_notes("  ").await.unwrap().len(), 2);

        let updated = f
            .records
            .update_note(
                &groceries.id,
                NotePatch {
                    html: Some("<p>comprar café</p>".to_string()),
                    ..NotePatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.plain_text, "comprar café");

        let copy = f
            .records
            .duplicate_note(&groceries.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(copy.title, "Mercado (cópia)");
        assert_eq!(copy.html, updated.html);
    }

    #[tokio::test]
    async fn search_lists_matches_item_text() {
        let f = fixture();
        let list = f.records.create_list(ListDraft::new("Compras")).await.unwrap();
        f.records
            .add_item(&list.id, ItemDraft::new("Pão integral"))
            .await
            .unwrap();
        f.records.create_list(ListDraft::new("Filmes")).await.unwrap();

        let found = f.records.search_lists("integral").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, list.id);
    }

    #[tokio::test]
    async fn upsert_by_name_overwrites_in_place() {
        let f = fixture();
        let existing = f.records.create_list(ListDraft::new("Compras")).await.unwrap();

        let mut draft = ListDraft::new("Compras");
        draft.items = vec![Item::new("Leite")];
        let upserted = f.records.upsert_list_by_name(draft).await.unwrap();
        assert!(upserted.is_overwrite());

        let lists = f.records.load_lists().await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, existing.id);
        assert_eq!(lists[0].items[0].text, "Leite");

        let created = f
            .records
            .upsert_list_by_name(ListDraft::new("Filmes"))
            .await
            .unwrap();
        assert!(!created.is_overwrite());
        assert_eq!(f.records.load_lists().await.unwrap().len(), 2);
    }
}
