use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `POST /api/sessions`
pub(crate) async fn process(sessions: web::Data<SessionsState>) -> impl Responder {
    match sessions.create().await {
        Ok(session_id) => {
            HttpResponse::Created().json(serde_json::json!({ "session_id": session_id }))
        }
        Err(e) => e.error_response(),
    }
}
