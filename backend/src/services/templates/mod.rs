//! # Template Service Module
//!
//! Endpoints for the certificate background of a session, under
//! `/api/sessions/{session_id}/template`.
//!
//! ## Sub-modules:
//! - `upload`: Decodes an uploaded PNG/JPEG and makes it the session's template.
//! - `preview`: Renders the template with every placed field filled with sample text.

mod preview;
mod upload;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/sessions/{session_id}/template";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /`** (multipart, part `file`):
///     - **Handler**: `upload::process`
///     - **Description**: Replaces the template and resizes the field layout to it.
///       Responds with the template's pixel size.
///
/// *   **`GET /preview`**:
///     - **Handler**: `preview::process`
///     - **Description**: Returns a PNG of the template with `Sample {field}` drawn for
///       each placed field.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(upload::process))
        .route("/preview", get().to(preview::process))
}
