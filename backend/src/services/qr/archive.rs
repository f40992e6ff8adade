//! `GET /api/sessions/{session_id}/qr/archive` downloads every QR-stamped
//! certificate as `certificates_with_qr.zip`. The archive is built once when the
//! pass finishes and served from memory.

use crate::error::SessionError;
use crate::services::zip_response;
use crate::session::SessionsState;
use actix_web::{web, Responder, ResponseError};

/// `GET /api/sessions/{session_id}/qr/archive`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let result = sessions
        .read(&session_id, |session| {
            session
                .qr
                .as_ref()
                .map(|run| run.archive.clone())
                .ok_or(SessionError::NoQrBatch)
        })
        .await;

    match result {
        Ok(archive) => zip_response("certificates_with_qr.zip", archive.bytes.clone()),
        Err(e) => e.error_response(),
    }
}
