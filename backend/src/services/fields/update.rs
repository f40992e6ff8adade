//! # Field Update
//!
//! `PUT /api/sessions/{session_id}/fields/{field_id}` moves or restyles a field.
//! Only the attributes present in the body change. A client dragging a field sends
//! the new percentages on every drop; values past an edge are clamped onto it
//! rather than rejected, and the font size is kept within `1..=MAX_FONT_SIZE`.

use crate::error::SessionError;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::field::FieldUpdate;

/// Applies a partial update to one field element.
///
/// # Arguments
/// * `path` - `(session_id, field_id)` extracted from the URL.
/// * `payload` - A `FieldUpdate`; absent attributes are left untouched.
///
/// # Returns
/// - `200 OK` with the element as stored, after clamping.
/// - `404 Not Found` if the session or the field does not exist.
pub(crate) async fn process(
    path: web::Path<(String, String)>,
    sessions: web::Data<SessionsState>,
    payload: web::Json<FieldUpdate>,
) -> impl Responder {
    let (session_id, field_id) = path.into_inner();
    let update = payload.into_inner();

    let result = sessions
        .update(&session_id, |session| {
            if !session.layout.update_field(&field_id, &update) {
                return Err(SessionError::FieldNotFound(field_id.clone()));
            }
            session
                .layout
                .get(&field_id)
                .cloned()
                .ok_or_else(|| SessionError::FieldNotFound(field_id.clone()))
        })
        .await;

    match result {
        Ok(element) => HttpResponse::Ok().json(element),
        Err(e) => e.error_response(),
    }
}
