//! Import of the app's own export envelope and of foreign text

use serde::{Deserialize, Serialize};

use super::parse::parse_foreign_text;
use super::Transfer;
use crate::error::{Error, Result};
use crate::models::{List, ListDraft, Note, NoteDraft};
use crate::services::Upserted;
use crate::storage::KeyValueStore;

/// What an envelope import did to the live collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub lists_created: usize,
    pub lists_updated: usize,
    pub notes_created: usize,
    pub notes_updated: usize,
    /// One message per record that overwrote a same-named live record
    pub conflicts: Vec<String>,
}

impl ImportReport {
    /// Number of records written
    #[must_use]
    pub const fn total(&self) -> usize {
        self.lists_created + self.lists_updated + self.notes_created + self.notes_updated
    }
}

/// The parts of [`ExportEnvelope`](super::ExportEnvelope) an import reads
#[derive(Debug, Deserialize)]
struct IncomingEnvelope {
    #[serde(default)]
    lists: Option<Vec<List>>,
    #[serde(default)]
    notes: Option<Vec<Note>>,
}

impl<S: KeyValueStore> Transfer<S> {
    /// Merge an export envelope into the store.
    ///
    /// Records are matched by trimmed name or title, not by id. A match is
    /// overwritten in place and reported as a conflict; anything else is
    /// created with a fresh id. Two distinct records sharing a name will
    /// therefore merge.
    pub async fn import_envelope(&self, json: &str) -> Result<ImportReport> {
        let envelope = serde_json::from_str::<IncomingEnvelope>(json)
            .map_err(|error| Error::InvalidInput(format!("Invalid export file: {error}")))?;
        if envelope.lists.is_none() && envelope.notes.is_none() {
            return Err(Error::InvalidInput(
                "Export file has neither lists nor notes".to_string(),
            ));
        }

        let mut report = ImportReport::default();
        for list in envelope.lists.unwrap_or_default() {
            let name = list.name.trim().to_string();
            match self.records.upsert_list_by_name(ListDraft::from(list)).await? {
                Upserted::Created(_) => report.lists_created += 1,
                Upserted::Overwritten(_) => {
                    report.lists_updated += 1;
                    report
                        .conflicts
                        .push(format!("List \"{name}\" already existed and was overwritten"));
                }
            }
        }
        for note in envelope.notes.unwrap_or_default() {
            let title = note.title.trim().to_string();
            match self.records.upsert_note_by_title(NoteDraft::from(note)).await? {
                Upserted::Created(_) => report.notes_created += 1,
                Upserted::Overwritten(_) => {
                    report.notes_updated += 1;
                    report
                        .conflicts
                        .push(format!("Note \"{title}\" already existed and was overwritten"));
                }
            }
        }

        self.stamp_import().await;
        tracing::info!(
            "Imported {} records ({} conflicts)",
            report.total(),
            report.conflicts.len()
        );
        Ok(report)
    }

    /// Recover a list from arbitrary text and store it as a new list.
    ///
    /// Only a storage failure is an error; unreadable text still yields a
    /// list with default metadata.
    pub async fn import_text(&self, raw: &str) -> Result<List> {
        let parsed = parse_foreign_text(raw);
        let list = self.records.create_list(parsed.into_draft()).await?;
        self.stamp_import().await;
        tracing::info!(
            "Imported list '{}' with {} items from text",
            list.name,
            list.items.len()
        );
        Ok(list)
    }

    async fn stamp_import(&self) {
        if let Err(error) = self.journal.mark_imported().await {
            tracing::warn!("Failed to record import time: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::tests::fixture;
    use crate::models::{Item, ListPatch};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn envelope_with_new_names_creates_records() {
        let (records, transfer) = fixture();
        let source = ListDraft {
            items: vec![Item::new("Leite")],
            ..ListDraft::new("Compras")
        }
        .into_list();
        let json = serde_json::json!({
            "lists": [source],
            "notes": [NoteDraft::new("Ideias", "texto").into_note()],
        })
        .to_string();

        let report = transfer.import_envelope(&json).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                lists_created: 1,
                notes_created: 1,
                ..ImportReport::default()
            }
        );

        let lists = records.load_lists().await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_ne!(lists[0].id, source.id);
        assert_eq!(lists[0].items, source.items);
    }

    #[tokio::test]
    async fn same_name_overwrites_and_reports_conflict() {
        let (records, transfer) = fixture();
        let existing = records.create_list(ListDraft::new("Compras")).await.unwrap();
        records
            .update_list(
                &existing.id,
                ListPatch {
                    color: Some("#000000".to_string()),
                    ..ListPatch::default()
                },
            )
            .await
            .unwrap();

        let incoming = ListDraft {
            color: Some("#FF0000".to_string()),
            items: vec![Item::new("Ovos")],
            ..ListDraft::new(" Compras ")
        }
        .into_list();
        let json = serde_json::json!({ "lists": [incoming] }).to_string();

        let report = transfer.import_envelope(&json).await.unwrap();
        assert_eq!(report.lists_updated, 1);
        assert_eq!(report.lists_created, 0);
        assert_eq!(report.conflicts.len(), 1);

        let lists = records.load_lists().await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, existing.id);
        assert_eq!(lists[0].created_at, existing.created_at);
        assert_eq!(lists[0].color.as_deref(), Some("#FF0000"));
        assert_eq!(lists[0].items.len(), 1);
    }

    #[tokio::test]
    async fn malformed_envelope_is_invalid_input() {
        let (_, transfer) = fixture();
        for payload in ["not json", "[]", "{}", r#"{"lists": 3}"#] {
            let error = transfer.import_envelope(payload).await.unwrap_err();
            assert!(matches!(error, Error::InvalidInput(_)), "{payload}");
        }
    }

    #[tokio::test]
    async fn import_text_creates_list() {
        let (records, transfer) = fixture();
        let list = transfer
            .import_text("Nome: Compras\n- Leite\n- Ovos [Proteínas]")
            .await
            .unwrap();

        assert_eq!(list.name, "Compras");
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.categories.len(), 1);
        assert_eq!(
            list.items[1].category.as_ref(),
            Some(&list.categories[0].id)
        );
        assert_eq!(records.load_lists().await.unwrap(), vec![list]);
    }
}
