//! # Issued QR Codes
//!
//! `GET /api/sessions/{session_id}/qr` lists what the last QR pass handed out: for
//! every stamped certificate its filename, the generated certificate id and the
//! validation URL encoded in the symbol. Certificates that could not be stamped
//! are reported under `errors`, and `cancelled` tells whether the pass was stopped
//! early.

use crate::error::SessionError;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// Returns the output of the last QR pass.
///
/// # Returns
/// - `200 OK` with `{issued, errors, cancelled}`.
/// - `400 Bad Request` if no QR pass has completed in this session.
/// - `404 Not Found` if the session does not exist.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let result = sessions
        .read(&session_id, |session| {
            session
                .qr
                .as_ref()
                .map(|run| run.output.clone())
                .ok_or(SessionError::NoQrBatch)
        })
        .await;

    match result {
        Ok(output) => HttpResponse::Ok().json(output),
        Err(e) => e.error_response(),
    }
}
