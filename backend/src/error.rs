//! Error taxonomy of the engine.
//!
//! Row- and recipient-scoped errors (`RenderError`, `DeliveryError`, per-file
//! `QrError`) are caught by the batch and delivery loops and recorded; the
//! remaining kinds stop the operation that raised them.

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template could not be decoded: {0}")]
    TemplateDecode(String),

    #[error("element '{field}' is positioned outside the image ({x_pct}%, {y_pct}%)")]
    ElementOutOfBounds { field: String, x_pct: f64, y_pct: f64 },

    #[error("element '{field}' cannot be rendered: {reason}")]
    InvalidElement { field: String, reason: String },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX parse error: {0}")]
    Xlsx(String),

    #[error("dataset is empty: {0}")]
    Empty(String),

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Malformed address or missing credential; the transport was not contacted.
    #[error("validation error: {0}")]
    Validation(String),

    /// The server rejected the credentials. Retrying with the same ones is pointless.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum QrError {
    #[error("certificate could not be decoded: {0}")]
    Decode(String),

    #[error("QR symbol could not be generated: {0}")]
    Encode(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of session-level operations, mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("no template has been uploaded")]
    MissingTemplate,

    #[error("no dataset has been uploaded")]
    MissingDataset,

    #[error("no fields have been placed on the template")]
    MissingFields,

    #[error("no certificates have been generated yet")]
    NoBatch,

    #[error("no QR annotated certificates have been generated yet")]
    NoQrBatch,

    #[error("no sender credentials have been provided")]
    MissingCredentials,

    #[error("another job is already running for this session: {0}")]
    SessionBusy(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("certificate not found: {0}")]
    CertificateNotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Qr(#[from] QrError),

    /// The blocking thread pool failed to run a task.
    #[error("background task failed: {0}")]
    Blocking(#[from] BlockingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResponseError for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::NotFound(_)
            | SessionError::FieldNotFound(_)
            | SessionError::CertificateNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::SessionBusy(_) => StatusCode::CONFLICT,
            SessionError::Delivery(DeliveryError::Auth(_)) => StatusCode::UNAUTHORIZED,
            SessionError::Delivery(DeliveryError::Transport(_)) => StatusCode::BAD_GATEWAY,
            SessionError::Archive(_)
            | SessionError::Qr(_)
            | SessionError::Blocking(_)
            | SessionError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(DeliveryError::Transport("reset".into()).is_retryable());
        assert!(!DeliveryError::Auth("535".into()).is_retryable());
        assert!(!DeliveryError::Validation("bad address".into()).is_retryable());
    }

    #[test]
    fn session_errors_map_to_status_codes() {
        assert_eq!(SessionError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(SessionError::SessionBusy("job".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(SessionError::MissingTemplate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            SessionError::Delivery(DeliveryError::Auth("no".into())).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn failed_blocking_task_is_a_server_error() {
        let err = actix_web::web::block(|| -> u32 { panic!("worker died") })
            .await
            .map_err(SessionError::from)
            .unwrap_err();
        assert!(matches!(err, SessionError::Blocking(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
