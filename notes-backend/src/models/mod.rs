mod grammar;
mod note;

pub use grammar::{GrammarCheckRequest, GrammarIssue, MAX_REPLACEMENTS};
pub use note::{CreateNoteRequest, Note, NoteSummary};
