//! Manages the participant dataset of a session.
//!
//! The provided routes are:
//! - `POST /api/sessions/{session_id}/dataset`: multipart upload (part `file`) of a
//!   `.csv` or `.xlsx` file. The file is parsed in full; the response lists the
//!   headers, the row count and the md5 fingerprint of the uploaded bytes, and tells
//!   whether the exact same file was already loaded.
//!
//! - `PUT /api/sessions/{session_id}/dataset/email_column`: selects the column holding
//!   recipient addresses (or clears it with `{"column": null}`). The response lists
//!   the rows whose address is missing or malformed; those rows still get a
//!   certificate but are not emailed.

use actix_web::web::{post, put, scope};
use actix_web::Scope;

mod email_column;
mod upload;

const API_PATH: &str = "/api/sessions/{session_id}/dataset";

/// Configures and returns the Actix scope for dataset routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(upload::process))
        .route("/email_column", put().to(email_column::process))
}
