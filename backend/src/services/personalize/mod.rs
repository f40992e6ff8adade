//! # Personalization Service
//!
//! `POST /api/sessions/{session_id}/personalize` renders a one-off certificate on
//! the session's template: the participant's name in the middle, their email below
//! it and, optionally, a photo. The photo arrives base64 encoded in the JSON body
//! (a `data:` URL prefix is accepted) and is placed at `photo_x`/`photo_y`, or at
//! the bottom-left by default.

mod generate;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/sessions/{session_id}/personalize";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(generate::process))
}
