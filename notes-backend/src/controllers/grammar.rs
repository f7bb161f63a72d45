//! Grammar-check endpoint

use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::models::GrammarCheckRequest;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/grammar-check").route(web::post().to(grammar_check)));
}

async fn grammar_check(
    state: web::Data<AppState>,
    body: web::Json<GrammarCheckRequest>,
) -> Result<HttpResponse, AppError> {
    let issues = state.grammar.check(&body.text).await?;
    Ok(HttpResponse::Ok().json(issues))
}
