//! Upload ingestion
//!
//! Accepts markdown and plain-text files, decodes them lossily as UTF-8 and
//! resolves the note title before delegating to the store.

use thiserror::Error;

use super::{NoteError, NoteStore};
use crate::models::Note;

/// Accepted upload suffixes, compared case-insensitively
pub const ALLOWED_SUFFIXES: &[&str] = &[".md", ".markdown", ".txt"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported upload {0:?}: expected a .md, .markdown or .txt file")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Note(#[from] NoteError),
}

/// Final path component of a client-supplied filename
pub fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}

/// Reject filenames without an accepted suffix
pub fn check_filename(filename: &str) -> Result<(), IngestError> {
    let lower = base_name(filename).to_lowercase();
    if ALLOWED_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFormat(filename.to_string()))
    }
}

/// Undecodable byte sequences become U+FFFD rather than failing the upload
pub fn decode_content(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Caller-supplied title when non-empty, otherwise the file's name
pub fn resolve_title(title: Option<&str>, filename: &str) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => base_name(filename).to_string(),
    }
}

/// Validate an uploaded file and store it as a note
pub fn ingest_upload(
    store: &NoteStore,
    filename: &str,
    bytes: &[u8],
    title: Option<&str>,
) -> Result<Note, IngestError> {
    check_filename(filename)?;

    let content = decode_content(bytes);
    let title = resolve_title(title, filename);

    log::debug!(
        "[NOTES] Ingesting upload {:?} ({} bytes) as {:?}",
        filename,
        bytes.len(),
        title
    );

    Ok(store.create(&title, &content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_filename() {
        assert!(check_filename("notes.md").is_ok());
        assert!(check_filename("NOTES.MD").is_ok());
        assert!(check_filename("guide.Markdown").is_ok());
        assert!(check_filename("todo.txt").is_ok());
        assert!(check_filename("dir/sub/notes.md").is_ok());

        assert!(matches!(
            check_filename("report.pdf"),
            Err(IngestError::UnsupportedFormat(_))
        ));
        assert!(check_filename("notes.md.exe").is_err());
        assert!(check_filename("").is_err());
    }

    #[test]
    fn test_decode_content_is_lossy() {
        assert_eq!(decode_content("héllo".as_bytes()), "héllo");
        assert_eq!(decode_content(&[b'a', 0xff, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_resolve_title() {
        assert_eq!(resolve_title(Some("Custom"), "notes.md"), "Custom");
        assert_eq!(resolve_title(Some("   "), "notes.md"), "notes.md");
        assert_eq!(resolve_title(None, "notes.md"), "notes.md");
        assert_eq!(resolve_title(None, "C:\\docs\\plan.md"), "plan.md");
    }

    #[test]
    fn test_ingest_upload() {
        let dir = tempdir().unwrap();
        let store = NoteStore::open(dir.path().join("notes.db").to_str().unwrap()).unwrap();

        let note =
            ingest_upload(&store, "notes.md", b"# Hello\n", None).expect("upload should succeed");
        assert_eq!(note.title, "notes.md");
        assert_eq!(note.content, "# Hello\n");

        let titled = ingest_upload(&store, "notes.txt", b"body", Some("Titled")).unwrap();
        assert_eq!(titled.title, "Titled");

        assert!(matches!(
            ingest_upload(&store, "report.pdf", b"%PDF", None),
            Err(IngestError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ingest_upload(&store, "empty.md", b"  \n", None),
            Err(IngestError::Note(NoteError::Validation(_)))
        ));

        assert_eq!(store.list().unwrap().len(), 2);
    }
}
