use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/sessions/{session_id}/errors`
pub(crate) async fn list(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    match sessions
        .read(&session_id, |session| Ok(session.errors.clone()))
        .await
    {
        Ok(errors) => HttpResponse::Ok().json(errors),
        Err(e) => e.error_response(),
    }
}

/// `DELETE /api/sessions/{session_id}/errors`
pub(crate) async fn clear(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    match sessions
        .update(&session_id, |session| {
            session.errors.clear();
            Ok(())
        })
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.error_response(),
    }
}
