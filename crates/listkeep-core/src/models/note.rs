//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;

/// A free-form note, independent of lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier
    pub id: RecordId,
    pub title: String,
    /// Plain text rendition of the content, used for search and previews
    #[serde(default)]
    pub plain_text: String,
    /// Rich content as produced by the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Refresh `updated_at` without moving it backwards
    pub fn touch(&mut self) {
        self.updated_at = crate::util::next_updated_at(self.updated_at);
    }
}

/// Fields for a new note; id and timestamps are assigned on creation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteDraft {
    pub title: String,
    pub plain_text: String,
    pub html: Option<String>,
    pub color: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NoteDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, plain_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            plain_text: plain_text.into(),
            ..Self::default()
        }
    }

    /// Materialize the draft with a fresh id and timestamps
    #[must_use]
    pub fn into_note(self) -> Note {
        let now = Utc::now();
        Note {
            id: RecordId::new(),
            title: self.title,
            plain_text: self.plain_text,
            html: self.html,
            color: self.color,
            tags: self.tags,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<Note> for NoteDraft {
    fn from(note: Note) -> Self {
        Self {
            title: note.title,
            plain_text: note.plain_text,
            html: note.html,
            color: note.color,
            tags: note.tags,
        }
    }
}

/// Partial update for a note; every `Some` field replaces the stored one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub plain_text: Option<String>,
    pub html: Option<String>,
    pub color: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    pub(crate) fn apply(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(plain_text) = self.plain_text {
            note.plain_text = plain_text;
        }
        if let Some(html) = self.html {
            note.html = Some(html);
        }
        if let Some(color) = self.color {
            note.color = Some(color);
        }
        if let Some(tags) = self.tags {
            note.tags = Some(tags);
        }
        note.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_draft_into_note() {
        let note = NoteDraft::new("Ideias", "Hello world").into_note();
        assert_eq!(note.title, "Ideias");
        assert_eq!(note.plain_text, "Hello world");
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_note_without_timestamps_deserializes() {
        let note: Note = serde_json::from_str(r#"{"id": "n1", "title": "Antiga"}"#).unwrap();
        assert_eq!(note.title, "Antiga");
        assert!(note.plain_text.is_empty());
    }

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let mut note = NoteDraft {
            color: Some("#FFCC00".to_string()),
            ..NoteDraft::new("Ideias", "one")
        }
        .into_note();
        let before = note.updated_at;

        NotePatch {
            plain_text: Some("two".to_string()),
            ..NotePatch::default()
        }
        .apply(&mut note);

        assert_eq!(note.plain_text, "two");
        assert_eq!(note.color.as_deref(), Some("#FFCC00"));
        assert!(note.updated_at >= before);
    }
}
