use crate::services::zip_response;
use crate::session::SessionsState;
use actix_web::{web, Responder, ResponseError};

const ARCHIVE_NAME: &str = "certificates.zip";

/// `GET /api/sessions/{session_id}/batch/archive`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    match sessions
        .read(&session_id, |session| Ok(session.require_batch()?.archive.clone()))
        .await
    {
        Ok(archive) => zip_response(ARCHIVE_NAME, archive.bytes.clone()),
        Err(e) => e.error_response(),
    }
}
