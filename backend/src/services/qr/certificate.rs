use crate::error::SessionError;
use crate::services::certificate_response;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/sessions/{session_id}/qr/{filename}`
///
/// Previews one QR-stamped certificate. Certificates the last QR pass failed to
/// stamp are not served here.
pub(crate) async fn process(
    path: web::Path<(String, String)>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let (session_id, filename) = path.into_inner();
    match stamped_certificate(&session_id, &sessions, filename).await {
        Ok(response) => response,
        Err(e) => e.error_response(),
    }
}

async fn stamped_certificate(
    session_id: &str,
    sessions: &SessionsState,
    filename: String,
) -> Result<HttpResponse, SessionError> {
    let file = sessions
        .read(session_id, |session| {
            let run = session.qr.as_ref().ok_or(SessionError::NoQrBatch)?;
            if !run.output.issued.iter().any(|code| code.filename == filename) {
                return Err(SessionError::CertificateNotFound(filename));
            }
            Ok(session.qr_dir().join(&filename))
        })
        .await?;
    certificate_response(file).await
}
