//! Notes REST API
//!
//! Create notes from pasted text or an uploaded markdown file, list them,
//! fetch the raw source, and render a note to a standalone HTML page.
//! Store calls run on the blocking pool; rendering is bounded by the
//! configured render timeout.

use actix_multipart::{Field, Multipart};
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{CreateNoteRequest, NoteSummary};
use crate::notes::ingest;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/notes")
            .route(web::get().to(list_notes))
            .route(web::post().to(create_note)),
    )
    .service(web::resource("/notes/upload").route(web::post().to(upload_note)))
    .service(web::resource("/notes/{id}").route(web::get().to(get_note)))
    .service(web::resource("/notes/{id}/render").route(web::get().to(render_note)));
}

async fn create_note(
    state: web::Data<AppState>,
    body: web::Json<CreateNoteRequest>,
) -> Result<HttpResponse, AppError> {
    let CreateNoteRequest { title, text } = body.into_inner();
    let store = Arc::clone(&state.notes);

    let note = web::block(move || store.create(&title, &text)).await??;
    Ok(HttpResponse::Ok().json(NoteSummary::from(note)))
}

/// Read one multipart field into memory, refusing anything over `limit` bytes
async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::Validation(format!("Failed to read upload data: {}", e)))?;
        if data.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(limit));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn upload_note(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let limit = state.config.max_body_bytes;
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut title: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Failed to process upload: {}", e)))?;

        let name = field.name().to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(|s| s.to_string());
        let data = read_field(&mut field, limit).await?;

        match name.as_str() {
            "title" => title = Some(ingest::decode_content(&data)),
            "file" => file = Some((filename.unwrap_or_default(), data)),
            // Unnamed file parts are accepted when no "file" part was sent
            _ if file.is_none() && filename.is_some() => {
                file = Some((filename.unwrap_or_default(), data));
            }
            _ => log::debug!("[NOTES] Ignoring multipart field {:?}", name),
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let store = Arc::clone(&state.notes);

    let note = web::block(move || {
        ingest::ingest_upload(&store, &filename, &bytes, title.as_deref())
    })
    .await??;

    Ok(HttpResponse::Ok().json(NoteSummary::from(note)))
}

async fn list_notes(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let store = Arc::clone(&state.notes);

    let notes = web::block(move || store.list()).await??;
    let summaries: Vec<NoteSummary> = notes.into_iter().map(NoteSummary::from).collect();

    Ok(HttpResponse::Ok().json(summaries))
}

async fn get_note(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let store = Arc::clone(&state.notes);

    let note = web::block(move || store.get(id)).await??;
    Ok(HttpResponse::Ok().json(note.into_source()))
}

async fn render_note(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let store = Arc::clone(&state.notes);
    let note = web::block(move || store.get(id)).await??;

    let renderer = state.renderer;
    let timeout = state.config.render.timeout;
    let html = tokio::time::timeout(
        timeout,
        web::block(move || renderer.render_document(&note.title, &note.content)),
    )
    .await
    .map_err(|_| AppError::RenderTimeout(timeout))??;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(html))
}
