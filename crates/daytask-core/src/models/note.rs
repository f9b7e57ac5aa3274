//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId, EntityKind, OwnerId, Record};
use crate::error::{Error, Result};
use crate::util::next_stamp;

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier
    pub id: EntityId,
    /// Plain text content
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Last modification, used for last-write-wins
    pub updated_at: DateTime<Utc>,
    /// `None` while the note belongs to a guest
    #[serde(default, rename = "userId")]
    pub owner_id: Option<OwnerId>,
}

impl Note {
    /// Get first line as title preview, truncated to `max_len` characters
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

impl Record for Note {
    const TABLE: &'static str = EntityKind::Note.table();

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Entity for Note {
    const KIND: EntityKind = EntityKind::Note;
    type Draft = NoteDraft;

    fn from_draft(
        draft: NoteDraft,
        id: EntityId,
        owner: Option<OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            id,
            content: validate_content(draft.content)?,
            created_at: now,
            updated_at: now,
            owner_id: owner,
        })
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = next_stamp(self.updated_at, now);
    }

    fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    fn set_owner_id(&mut self, owner: OwnerId) {
        self.owner_id = Some(owner);
    }
}

/// Input for creating a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub content: String,
}

impl NoteDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Edit of an existing note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub content: Option<String>,
}

impl NotePatch {
    pub fn apply(self, note: &mut Note) -> Result<()> {
        if let Some(content) = self.content {
            note.content = validate_content(content)?;
        }
        Ok(())
    }
}

/// Whitespace-only content counts as empty; surrounding newlines are dropped.
fn validate_content(raw: String) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(Error::InvalidInput("Note content cannot be empty".to_string()));
    }
    Ok(raw.trim_matches(|c| c == '\n' || c == '\r').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_from_draft() {
        let note = Note::from_draft(NoteDraft::new("Hello world"), EntityId::new(), None, Utc::now())
            .unwrap();
        assert_eq!(note.content, "Hello world");
        assert_eq!(note.created_at, note.updated_at);
        assert!(note.owner_id.is_none());
    }

    #[test]
    fn test_blank_note_rejected() {
        let result = Note::from_draft(NoteDraft::new(" \n\t "), EntityId::new(), None, Utc::now());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_title_preview() {
        let note = Note::from_draft(
            NoteDraft::new("First line\nSecond line\nThird line"),
            EntityId::new(),
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(note.title_preview(50), "First line");
        assert_eq!(note.title_preview(5), "First");
    }

    #[test]
    fn test_patch_keeps_multiline_text() {
        let mut note = Note::from_draft(NoteDraft::new("old"), EntityId::new(), None, Utc::now())
            .unwrap();
        NotePatch {
            content: Some("line 1\nline 2\n".to_string()),
        }
        .apply(&mut note)
        .unwrap();
        assert_eq!(note.content, "line 1\nline 2");
    }

    #[test]
    fn test_note_deserializes_null_owner() {
        let raw = r#"{
            "id": "n1",
            "content": "hi",
            "createdAt": "2025-02-01T00:00:00Z",
            "updatedAt": "2025-02-01T00:00:00Z",
            "userId": null
        }"#;
        let note: Note = serde_json::from_str(raw).unwrap();
        assert_eq!(note.id.as_str(), "n1");
        assert!(note.owner_id.is_none());
    }
}
