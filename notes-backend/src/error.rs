//! API error taxonomy and its HTTP mapping
//!
//! Client errors carry their message to the caller; server-side failures are
//! logged in full and answered with a short generic message.

use actix_web::error::{BlockingError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::grammar::GrammarError;
use crate::notes::{IngestError, NoteError};

/// Message returned for rejected upload extensions
pub const UPLOAD_FORMAT_MESSAGE: &str = "Please upload a markdown (.md) file";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", UPLOAD_FORMAT_MESSAGE)]
    UploadFormat,

    #[error("Note not found")]
    NotFound,

    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("rendering timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// The message safe to show to API callers
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_)
            | Self::UploadFormat
            | Self::NotFound
            | Self::PayloadTooLarge(_) => self.to_string(),
            Self::Grammar(GrammarError::Timeout(_)) => "Grammar check timed out".to_string(),
            Self::Grammar(GrammarError::RateLimited) => {
                "Grammar service rate limit exceeded".to_string()
            }
            Self::Grammar(_) => "Grammar service unavailable".to_string(),
            Self::RenderTimeout(_) => "Rendering timed out".to_string(),
            Self::Persistence(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<NoteError> for AppError {
    fn from(e: NoteError) -> Self {
        match e {
            NoteError::Validation(msg) => Self::Validation(msg),
            NoteError::NotFound(_) => Self::NotFound,
            NoteError::Persistence(e) => Self::Persistence(e.to_string()),
            NoteError::Io(e) => Self::Persistence(e.to_string()),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::UnsupportedFormat(_) => Self::UploadFormat,
            IngestError::Note(e) => e.into(),
        }
    }
}

impl From<BlockingError> for AppError {
    fn from(e: BlockingError) -> Self {
        Self::Internal(format!("blocking task failed: {}", e))
    }
}

impl From<JsonPayloadError> for AppError {
    fn from(e: JsonPayloadError) -> Self {
        match e {
            JsonPayloadError::OverflowKnownLength { limit, .. }
            | JsonPayloadError::Overflow { limit } => Self::PayloadTooLarge(limit),
            other => Self::Validation(format!("Invalid request body: {}", other)),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UploadFormat => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Grammar(GrammarError::Unavailable(_) | GrammarError::Timeout(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Grammar(GrammarError::RateLimited | GrammarError::Upstream(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::RenderTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }

        HttpResponse::build(status).json(ErrorBody {
            error: self.public_message(),
        })
    }
}
