//! Whole-store export envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::markdown;
use crate::models::{List, Note};

/// File format of a whole-store export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// The re-importable [`ExportEnvelope`]
    Json,
    /// Human-readable document, see [`markdown::render_export`]
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }

    /// Render `envelope` in this format
    pub fn render(self, envelope: &ExportEnvelope) -> serde_json::Result<String> {
        match self {
            Self::Json => render_envelope(envelope),
            Self::Markdown => Ok(markdown::render_export(envelope)),
        }
    }
}

/// Audit data attached to every export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub version: String,
    pub device_id: String,
    pub total_lists: usize,
    pub total_items: usize,
    pub total_notes: usize,
}

/// The portable document produced by an export and consumed by
/// [`Transfer::import_envelope`](super::Transfer::import_envelope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub lists: Vec<List>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub metadata: ExportMetadata,
}

/// Wrap the given records with export metadata stamped now.
#[must_use]
pub fn build_envelope(
    lists: Vec<List>,
    notes: Vec<Note>,
    device_id: impl Into<String>,
    version: impl Into<String>,
) -> ExportEnvelope {
    let metadata = ExportMetadata {
        exported_at: Utc::now(),
        version: version.into(),
        device_id: device_id.into(),
        total_lists: lists.len(),
        total_items: lists.iter().map(|list| list.items.len()).sum(),
        total_notes: notes.len(),
    };

    ExportEnvelope {
        lists,
        notes,
        metadata,
    }
}

/// Render an envelope as pretty-printed JSON.
pub fn render_envelope(envelope: &ExportEnvelope) -> serde_json::Result<String> {
    serde_json::to_string_pretty(envelope)
}

/// File name for an export taken at `exported_at`
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, exported_at: DateTime<Utc>) -> String {
    format!(
        "listkeep-export-{}.{}",
        exported_at.timestamp_millis(),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, ListDraft, NoteDraft};
    use pretty_assertions::assert_eq;

    #[test]
    fn build_envelope_counts_records() {
        let mut draft = ListDraft::new("Compras");
        draft.items = vec![Item::new("Leite"), Item::new("Ovos")];
        let lists = vec![draft.into_list(), ListDraft::new("Filmes").into_list()];
        let notes = vec![NoteDraft::new("Ideias", "").into_note()];

        let envelope = build_envelope(lists, notes, "device-abc", "1.0");
        assert_eq!(envelope.metadata.total_lists, 2);
        assert_eq!(envelope.metadata.total_items, 2);
        assert_eq!(envelope.metadata.total_notes, 1);
        assert_eq!(envelope.metadata.device_id, "device-abc");
    }

    #[test]
    fn render_envelope_uses_camel_case_metadata() {
        let envelope = build_envelope(Vec::new(), Vec::new(), "device-abc", "1.0");
        let rendered = render_envelope(&envelope).unwrap();

        assert!(rendered.contains("\"exportedAt\""));
        assert!(rendered.contains("\"deviceId\": \"device-abc\""));
        assert!(rendered.contains("\"totalItems\": 0"));

        let parsed: ExportEnvelope = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn file_name_carries_export_millis_and_extension() {
        let exported_at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, exported_at),
            "listkeep-export-1700000000123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, exported_at),
            "listkeep-export-1700000000123.md"
        );
    }

    #[test]
    fn markdown_format_renders_lists_then_notes() {
        let lists = vec![ListDraft::new("Compras").into_list()];
        let notes = vec![NoteDraft::new("Ideias", "pintar a sala").into_note()];
        let envelope = build_envelope(lists, notes, "device-abc", "1.0");

        let rendered = ExportFormat::Markdown.render(&envelope).unwrap();
        let compras = rendered.find("# Compras").unwrap();
        let ideias = rendered.find("# Ideias").unwrap();
        assert!(compras < ideias);
        assert!(rendered.contains("\n---\n"));
    }
}
