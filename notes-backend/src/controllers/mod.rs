pub mod grammar;
pub mod health;
pub mod notes;

use actix_web::web;

use crate::error::AppError;

/// JSON extractor settings: body limit plus `{"error": ...}` rejections
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| AppError::from(err).into())
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::web;
    use std::sync::Arc;
    use std::time::Instant;
    use tempfile::TempDir;

    use crate::config::Config;
    use crate::grammar::{GrammarChecker, GrammarProvider};
    use crate::notes::{MarkdownRenderer, NoteStore};
    use crate::AppState;

    /// App state backed by a database inside `dir` and the given grammar provider
    pub fn app_state(
        dir: &TempDir,
        provider: Option<Box<dyn GrammarProvider>>,
    ) -> web::Data<AppState> {
        let config = Config::default();
        let db_path = dir.path().join("notes.db");
        let notes = NoteStore::open(db_path.to_str().unwrap()).expect("Failed to open store");

        let grammar = match provider {
            Some(provider) => GrammarChecker::with_provider(provider, config.grammar.timeout),
            None => GrammarChecker::unavailable("not configured in tests", config.grammar.timeout),
        };

        web::Data::new(AppState {
            notes: Arc::new(notes),
            grammar: Arc::new(grammar),
            renderer: MarkdownRenderer::new(config.render.allow_raw_html),
            config,
            started_at: Instant::now(),
        })
    }
}
