use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::EmailColumnRequest;

/// `PUT /api/sessions/{session_id}/dataset/email_column`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    payload: web::Json<EmailColumnRequest>,
) -> impl Responder {
    let column = payload.into_inner().column;
    let result = sessions
        .update(&session_id, |session| {
            let invalid_rows = session.set_email_column(column)?;
            Ok((session.email_column.clone(), invalid_rows))
        })
        .await;

    match result {
        Ok((column, invalid_rows)) => HttpResponse::Ok().json(serde_json::json!({
            "email_column": column,
            "invalid_rows": invalid_rows,
        })),
        Err(e) => e.error_response(),
    }
}
