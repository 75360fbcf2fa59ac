//! Whole-store export and import.
//!
//! Exports produce an [`ExportEnvelope`]; imports accept either that
//! envelope or arbitrary text, which goes through [`parse_foreign_text`].

mod export;
mod import;
pub mod markdown;
mod parse;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use export::{
    build_envelope, render_envelope, suggested_export_file_name, ExportEnvelope, ExportFormat,
    ExportMetadata,
};
pub use import::ImportReport;
pub use parse::{parse_foreign_text, ParsedItem, ParsedList, DEFAULT_LIST_COLOR, DEFAULT_LIST_NAME};

use crate::error::Result;
use crate::models::RecordId;
use crate::services::{RecordStore, SyncJournal};
use crate::storage::KeyValueStore;

/// Export and import over a shared record store
pub struct Transfer<S> {
    records: Arc<RecordStore<S>>,
    journal: Arc<SyncJournal<S>>,
    export_version: String,
}

impl<S: KeyValueStore> Transfer<S> {
    pub fn new(
        records: Arc<RecordStore<S>>,
        journal: Arc<SyncJournal<S>>,
        export_version: impl Into<String>,
    ) -> Self {
        Self {
            records,
            journal,
            export_version: export_version.into(),
        }
    }

    async fn snapshot(&self) -> Result<ExportEnvelope> {
        let lists = self.records.load_lists().await?;
        let notes = self.records.load_notes().await?;
        let device_id = self.journal.device_id().await?;
        Ok(build_envelope(lists, notes, device_id, &self.export_version))
    }

    async fn stamp_export(&self) {
        if let Err(error) = self.journal.mark_exported().await {
            tracing::warn!("Failed to record export time: {}", error);
        }
    }

    /// Snapshot every list and note into an envelope
    pub async fn export_all(&self) -> Result<ExportEnvelope> {
        let envelope = self.snapshot().await?;
        self.stamp_export().await;
        tracing::info!(
            "Exported {} lists and {} notes",
            envelope.metadata.total_lists,
            envelope.metadata.total_notes
        );
        Ok(envelope)
    }

    /// Export everything as pretty JSON into `path`, creating parent
    /// directories as needed
    pub async fn export_to_path(&self, path: impl AsRef<Path>) -> Result<ExportEnvelope> {
        let path = path.as_ref();
        let envelope = self.snapshot().await?;
        write_export(path, &render_envelope(&envelope)?).await?;

        self.stamp_export().await;
        tracing::info!("Wrote export to {}", path.display());
        Ok(envelope)
    }

    /// Export everything into `dir` under a timestamped file name and return
    /// the written path
    pub async fn export_to_dir(
        &self,
        dir: impl AsRef<Path>,
        format: ExportFormat,
    ) -> Result<PathBuf> {
        let envelope = self.snapshot().await?;
        let path = dir.as_ref().join(suggested_export_file_name(
            format,
            envelope.metadata.exported_at,
        ));
        write_export(&path, &format.render(&envelope)?).await?;

        self.stamp_export().await;
        tracing::info!("Wrote {:?} export to {}", format, path.display());
        Ok(path)
    }

    /// Render one list in the re-importable markdown template
    pub async fn export_list_markdown(&self, id: &RecordId) -> Result<Option<String>> {
        Ok(self
            .records
            .get_list(id)
            .await?
            .map(|list| markdown::render_list(&list)))
    }

    /// Render one note as markdown
    pub async fn export_note_markdown(&self, id: &RecordId) -> Result<Option<String>> {
        Ok(self
            .records
            .get_note(id)
            .await?
            .map(|note| markdown::render_note(&note)))
    }
}

async fn write_export(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Item, ListDraft, NoteDraft};
    use crate::services::{StaticProbe, TrashBin};
    use crate::storage::{Collection, MemoryStore, LISTS_KEY, NOTES_KEY};
    use pretty_assertions::assert_eq;

    pub(crate) fn fixture() -> (Arc<RecordStore<MemoryStore>>, Transfer<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let lists = Arc::new(Collection::new(Arc::clone(&store), LISTS_KEY));
        let notes = Arc::new(Collection::new(Arc::clone(&store), NOTES_KEY));
        let journal = Arc::new(SyncJournal::new(
            Arc::clone(&store),
            Arc::new(StaticProbe(false)),
        ));
        let trash = Arc::new(TrashBin::new(
            Arc::clone(&store),
            Arc::clone(&lists),
            Arc::clone(&notes),
            Arc::clone(&journal),
        ));
        let records = Arc::new(RecordStore::new(lists, notes, trash, Arc::clone(&journal)));
        let transfer = Transfer::new(Arc::clone(&records), journal, "1.0");
        (records, transfer)
    }

    #[tokio::test]
    async fn export_all_stamps_last_export() {
        let (records, transfer) = fixture();
        records
            .create_list(ListDraft {
                items: vec![Item::new("Leite")],
                ..ListDraft::new("Compras")
            })
            .await
            .unwrap();
        records
            .create_note(NoteDraft::new("Ideias", ""))
            .await
            .unwrap();

        let envelope = transfer.export_all().await.unwrap();
        assert_eq!(envelope.metadata.total_lists, 1);
        assert_eq!(envelope.metadata.total_items, 1);
        assert_eq!(envelope.metadata.total_notes, 1);
        assert!(envelope.metadata.device_id.starts_with("device-"));
        assert_eq!(envelope.metadata.version, "1.0");

        let status = transfer.journal.status().await.unwrap();
        assert!(status.last_export.is_some());
    }

    #[tokio::test]
    async fn export_to_path_writes_envelope() {
        let (records, transfer) = fixture();
        records.create_list(ListDraft::new("Compras")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports").join("backup.json");
        let envelope = transfer.export_to_path(&path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: ExportEnvelope = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[tokio::test]
    async fn export_to_dir_names_file_after_format() {
        let (records, transfer) = fixture();
        records.create_list(ListDraft::new("Compras")).await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let json_path = transfer
            .export_to_dir(dir.path(), ExportFormat::Json)
            .await
            .unwrap();
        let markdown_path = transfer
            .export_to_dir(dir.path(), ExportFormat::Markdown)
            .await
            .unwrap();

        assert_eq!(json_path.extension().unwrap(), "json");
        let written = std::fs::read_to_string(&json_path).unwrap();
        let parsed: ExportEnvelope = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.lists[0].name, "Compras");

        assert_eq!(markdown_path.extension().unwrap(), "md");
        let written = std::fs::read_to_string(&markdown_path).unwrap();
        assert!(written.starts_with("# Compras\n"));
    }

    #[tokio::test]
    async fn exported_envelope_imports_into_fresh_store() {
        let (records, transfer) = fixture();
        let list = records
            .create_list(ListDraft {
                description: Some("Semana".to_string()),
                items: vec![Item::new("Leite"), Item::new("Ovos")],
                allows_random_pick: true,
                ..ListDraft::new("Compras")
            })
            .await
            .unwrap();
        let json = render_envelope(&transfer.export_all().await.unwrap()).unwrap();

        let (other_records, other_transfer) = fixture();
        other_transfer.import_envelope(&json).await.unwrap();

        let imported = other_records.load_lists().await.unwrap();
        assert_eq!(imported.len(), 1);
        assert_ne!(imported[0].id, list.id);
        assert_eq!(
            ListDraft::from(imported[0].clone()),
            ListDraft::from(list)
        );
    }

    #[tokio::test]
    async fn markdown_exports_missing_record_as_none() {
        let (records, transfer) = fixture();
        let list = records.create_list(ListDraft::new("Viagem")).await.unwrap();

        let rendered = transfer.export_list_markdown(&list.id).await.unwrap();
        assert!(rendered.unwrap().starts_with("# Viagem\n"));
        assert!(transfer
            .export_note_markdown(&RecordId::new())
            .await
            .unwrap()
            .is_none());
    }
}
