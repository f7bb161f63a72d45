use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)));
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/version").route(web::get().to(get_version)));
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "message": "Notes service is running"
    }))
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let grammar_provider = state
        .grammar
        .provider_kind()
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "unavailable".to_string());

    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "grammar_provider": grammar_provider,
        "uptime_secs": state.started_at.elapsed().as_secs()
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
