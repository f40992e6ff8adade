//! # Session Service Module
//!
//! Lifecycle of client sessions under `/api/sessions`.
//!
//! ## Sub-modules:
//! - `create`: Opens a new session with its own work directory.
//! - `status`: What the session currently holds and which job it runs.
//! - `delete`: Drops the session and deletes its files.
//! - `cancel`: Raises the session's cancel flag; the running job stops at the next
//!   row or recipient and keeps what it already produced.
//! - `errors`: Reads or clears the session's error log.

mod cancel;
mod create;
mod delete;
mod errors;
mod status;

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/sessions";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("/{session_id}", get().to(status::process))
        .route("/{session_id}", delete().to(delete::process))
        .route("/{session_id}/cancel", post().to(cancel::process))
        .route("/{session_id}/errors", get().to(errors::list))
        .route("/{session_id}/errors", delete().to(errors::clear))
}
