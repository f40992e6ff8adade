use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/sessions/{session_id}/fields`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    match sessions
        .read(&session_id, |session| Ok(session.layout.clone()))
        .await
    {
        Ok(layout) => HttpResponse::Ok().json(layout),
        Err(e) => e.error_response(),
    }
}
