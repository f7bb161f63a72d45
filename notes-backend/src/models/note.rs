use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted note: a title plus its markdown source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn into_source(self) -> NoteSource {
        NoteSource {
            title: self.title,
            text: self.content,
        }
    }
}

/// Note metadata without its content (create and list responses)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteSummary {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Raw markdown of a note, as returned by `GET /notes/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSource {
    pub title: String,
    pub text: String,
}

/// Request to create a note from pasted text
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub text: String,
}
