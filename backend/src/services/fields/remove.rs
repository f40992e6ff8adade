//! # Field Removal
//!
//! `DELETE /api/sessions/{session_id}/fields/{field_id}` drops one element from the
//! session's layout. The remaining elements keep their order and positions.
//!
//! Removing an id that is not in the layout changes nothing and is answered the same
//! way as a real removal, so a client may repeat the call safely.

use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::debug;

/// Removes a field element from the session's layout.
///
/// # Arguments
/// * `path` - `(session_id, field_id)` extracted from the URL.
/// * `sessions` - The shared session map.
///
/// # Returns
/// - `204 No Content` whether or not the field existed.
/// - `404 Not Found` if the session does not exist.
pub(crate) async fn process(
    path: web::Path<(String, String)>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let (session_id, field_id) = path.into_inner();
    let result = sessions
        .update(&session_id, |session| Ok(session.layout.remove_field(&field_id)))
        .await;

    match result {
        Ok(removed) => {
            if !removed {
                debug!("[session {}] field {} was not in the layout", session_id, field_id);
            }
            HttpResponse::NoContent().finish()
        }
        Err(e) => e.error_response(),
    }
}
