//! SQLite-backed markdown notes
//!
//! The store owns the note collection; ingestion validates uploads before
//! handing them to the store; rendering turns stored markdown into HTML.

pub mod ingest;
pub mod render;
pub mod store;

use thiserror::Error;

pub use ingest::IngestError;
pub use render::MarkdownRenderer;
pub use store::NoteStore;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("{0}")]
    Validation(String),

    #[error("note {0} not found")]
    NotFound(i64),

    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}
