use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `DELETE /api/sessions/{session_id}`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    match sessions.remove(&session_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.error_response(),
    }
}
