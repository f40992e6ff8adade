//! # Single Certificate Download
//!
//! `GET /api/sessions/{session_id}/batch/{filename}` returns one certificate of the
//! last batch run as a PNG, for previewing a result without fetching the archive.
//! Only names listed in the batch summary are served.

use crate::error::SessionError;
use crate::services::certificate_response;
use crate::session::SessionsState;
use actix_web::{web, Responder, ResponseError};

/// Returns one rendered certificate.
///
/// # Arguments
/// * `path` - `(session_id, filename)` extracted from the URL.
/// * `sessions` - The shared session map.
///
/// # Returns
/// - `200 OK` with the PNG bytes.
/// - `400 Bad Request` if no batch has run yet.
/// - `404 Not Found` if the session is unknown or `filename` is not part of the batch.
pub(crate) async fn process(
    path: web::Path<(String, String)>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let (session_id, filename) = path.into_inner();
    match certificate(&session_id, &sessions, filename).await {
        Ok(response) => response,
        Err(e) => e.error_response(),
    }
}

async fn certificate(
    session_id: &str,
    sessions: &SessionsState,
    filename: String,
) -> Result<actix_web::HttpResponse, SessionError> {
    let file = sessions
        .read(session_id, |session| {
            let batch = session.require_batch()?;
            if !batch.summary.filenames.contains(&filename) {
                return Err(SessionError::CertificateNotFound(filename));
            }
            Ok(session.certificates_dir().join(&filename))
        })
        .await?;
    certificate_response(file).await
}
