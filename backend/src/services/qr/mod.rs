//! # QR Validation Service
//!
//! Stamps verification QR codes onto the certificates of the last batch run,
//! under `/api/sessions/{session_id}/qr`.
//!
//! ## Sub-modules:
//! - `start`: Background job annotating every certificate into `certificates_with_qr/`.
//! - `issued`: The certificate ids and validation URLs handed out by the last pass.
//! - `archive`: `certificates_with_qr.zip`.
//! - `certificate`: One stamped certificate, for preview.
//!
//! A certificate that could not be stamped keeps its plain version; delivery then
//! attaches that one instead.

mod archive;
mod certificate;
mod issued;
mod start;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/sessions/{session_id}/qr";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/start", post().to(start::process))
        .route("", get().to(issued::process))
        .route("/archive", get().to(archive::process))
        .route("/{filename}", get().to(certificate::process))
}
