use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod config;
mod controllers;
mod error;
mod grammar;
mod models;
mod notes;

use config::Config;
use grammar::GrammarChecker;
use notes::{MarkdownRenderer, NoteStore};

/// Shared state handed to every request handler
pub struct AppState {
    pub notes: Arc<NoteStore>,
    pub grammar: Arc<GrammarChecker>,
    pub renderer: MarkdownRenderer,
    pub config: Config,
    pub started_at: Instant,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Starting notes-backend v{}", controllers::health::VERSION);

    let config = Config::from_env();

    log::info!("Opening note database at {}", config.database_url);
    let notes = NoteStore::open(&config.database_url).map_err(|e| {
        log::error!("Failed to open note database: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let notes = Arc::new(notes);

    log::info!("Initializing grammar checker");
    let grammar = GrammarChecker::init(&config.grammar).await.map_err(|e| {
        log::error!("Grammar checking is required but unavailable: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let grammar = Arc::new(grammar);

    let renderer = MarkdownRenderer::new(config.render.allow_raw_html);
    if config.render.allow_raw_html {
        log::warn!(
            "[RENDER] Raw HTML in notes is passed through unsanitized; set {}=false to escape it",
            config::env_vars::RENDER_ALLOW_RAW_HTML
        );
    }

    let bind_address = config.bind_address.clone();
    let port = config.port;
    let max_body_bytes = config.max_body_bytes;

    let state = web::Data::new(AppState {
        notes,
        grammar: Arc::clone(&grammar),
        renderer,
        config,
        started_at: Instant::now(),
    });

    log::info!("Starting server on {}:{}", bind_address, port);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(controllers::json_config(max_body_bytes))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::grammar::config)
            .configure(controllers::notes::config)
    })
    .bind((bind_address.as_str(), port))?
    .run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    // Spawn Ctrl+C handler
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        log::info!("Stopping HTTP server...");
        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(Duration::from_secs(5), server_stop).await.is_err() {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }
    });

    let result = server.await;

    // The local grammar engine is a child process; release it once requests have drained
    log::info!("Stopping grammar provider...");
    grammar.shutdown().await;
    log::info!("Shutdown complete");

    result
}
