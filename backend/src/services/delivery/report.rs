use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/sessions/{session_id}/delivery`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let result = sessions
        .read(&session_id, |session| {
            Ok(serde_json::json!({
                "records": session.deliveries.records(),
                "summary": session.deliveries.summary(),
                "last_report": session.last_report,
                "sender": session.credentials.as_ref().map(|c| c.address.clone()),
            }))
        })
        .await;

    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => e.error_response(),
    }
}
