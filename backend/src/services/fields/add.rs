//! # Field Creation
//!
//! `POST /api/sessions/{session_id}/fields` places a new text field on the template,
//! bound to one dataset column. The field starts centered; its font size defaults
//! to the layout default and is capped at `MAX_FONT_SIZE`, and its color defaults
//! to black.
//!
//! When a dataset is already loaded the column must exist in it, so a typo is caught
//! before any batch runs. Without a dataset any name is accepted and checked against
//! the rows at render time, where a missing column draws nothing.

use crate::error::SessionError;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::field::{FieldElement, DEFAULT_FONT_SIZE};
use common::requests::AddFieldRequest;
use log::debug;

/// Adds a field element to the session's layout.
///
/// # Arguments
/// * `session_id` - The session, extracted from the URL path.
/// * `payload` - An `AddFieldRequest` with the column name and optional size and color.
///
/// # Returns
/// - `201 Created` with the new `FieldElement`, including its resolved pixel position
///   once a template is known.
/// - `400 Bad Request` if the name is blank or not a column of the loaded dataset.
/// - `404 Not Found` if the session does not exist.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    payload: web::Json<AddFieldRequest>,
) -> impl Responder {
    match add_field(&session_id, &sessions, payload.into_inner()).await {
        Ok(element) => HttpResponse::Created().json(element),
        Err(e) => e.error_response(),
    }
}

/// Adds a field bound to `req.field_name`. When a dataset is loaded the column
/// must exist in it.
async fn add_field(
    session_id: &str,
    sessions: &SessionsState,
    req: AddFieldRequest,
) -> Result<FieldElement, SessionError> {
    let field_name = req.field_name.trim().to_string();
    if field_name.is_empty() {
        return Err(SessionError::BadRequest("field_name is required".to_string()));
    }

    sessions
        .update(session_id, |session| {
            if let Some(dataset) = &session.dataset {
                if !dataset.has_column(&field_name) {
                    return Err(SessionError::UnknownColumn(field_name));
                }
            }
            let element = session
                .layout
                .add_field(
                    field_name,
                    req.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                    req.color.unwrap_or_default(),
                )
                .clone();
            debug!("[session {}] added field {}", session.id, element.id);
            Ok(element)
        })
        .await
}
