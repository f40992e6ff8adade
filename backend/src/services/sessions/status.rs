use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/sessions/{session_id}`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let result = sessions
        .read(&session_id, |session| {
            Ok(serde_json::json!({
                "session_id": session.id,
                "template_size": session.template.as_ref().map(|t| (t.width(), t.height())),
                "headers": session.dataset.as_ref().map(|d| d.headers.clone()),
                "rows": session.dataset.as_ref().map(|d| d.len()),
                "dataset_fingerprint": session.dataset_fingerprint,
                "fields": session.layout.elements().len(),
                "email_column": session.email_column,
                "has_credentials": session.credentials.is_some(),
                "certificates": session.batch.as_ref().map(|b| b.summary.certificates),
                "qr_codes": session.qr.as_ref().map(|q| q.output.issued.len()),
                "active_job": session.active_job,
                "errors": session.errors.len(),
            }))
        })
        .await;

    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => e.error_response(),
    }
}
