//! SQLite-backed note persistence
//!
//! Owns a single connection behind a mutex. Ids come from an AUTOINCREMENT
//! column assigned inside the insert transaction, so concurrent creates never
//! share an id and a rolled-back insert never surfaces a row.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use super::NoteError;
use crate::models::Note;

/// Longest accepted title, in characters
pub const MAX_TITLE_CHARS: usize = 255;

const SELECT_NOTE: &str = "SELECT id, title, content, created_at, updated_at FROM notes";

/// Durable note storage
pub struct NoteStore {
    conn: Mutex<Connection>,
}

impl NoteStore {
    /// Open (or create) the note database at `db_path`
    pub fn open(db_path: &str) -> Result<Self, NoteError> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, NoteError> {
        let journal: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("[NOTES] journal_mode={}", journal);

        conn.execute_batch(
            "PRAGMA synchronous = FULL;
             CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 255),
                content TEXT NOT NULL CHECK (length(content) >= 1),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes (created_at);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a note, returning the stored entity.
    ///
    /// The title is stored trimmed; the content is stored verbatim.
    pub fn create(&self, title: &str, content: &str) -> Result<Note, NoteError> {
        let title = validate(title, content)?;

        let mut conn = self.conn.lock();
        // Stamped under the lock so created_at never decreases as ids grow
        let now = format_timestamp(Utc::now());
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO notes (title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![title, content, now],
        )?;
        let id = tx.last_insert_rowid();

        let note = tx.query_row(&format!("{} WHERE id = ?1", SELECT_NOTE), [id], note_from_row)?;
        tx.commit()?;

        log::info!("[NOTES] Created note {} ({:?})", note.id, note.title);
        Ok(note)
    }

    /// All notes, most recently created first
    pub fn list(&self) -> Result<Vec<Note>, NoteError> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at DESC, id DESC", SELECT_NOTE))?;
        let notes = stmt
            .query_map([], note_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    pub fn get(&self, id: i64) -> Result<Note, NoteError> {
        let conn = self.conn.lock();

        conn.query_row(&format!("{} WHERE id = ?1", SELECT_NOTE), [id], note_from_row)
            .optional()?
            .ok_or(NoteError::NotFound(id))
    }
}

/// Check a (title, content) pair, returning the trimmed title
pub fn validate(title: &str, content: &str) -> Result<String, NoteError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(NoteError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(NoteError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    if content.trim().is_empty() {
        return Err(NoteError::Validation("text must not be empty".to_string()));
    }
    Ok(title.to_string())
}

/// Microsecond RFC 3339 in UTC, so lexical order matches chronological order
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn note_from_row(row: &Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_timestamp(row, 3)?,
        updated_at: parse_timestamp(row, 4)?,
    })
}
