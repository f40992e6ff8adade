//! # Batch Service Module
//!
//! Certificate generation for a whole dataset, under
//! `/api/sessions/{session_id}/batch`.
//!
//! ## Workflow:
//!
//! 1.  **Start**: `POST /start` snapshots the template, dataset and layout of the
//!     session and renders every row in a background job. The `job_id` is polled
//!     through `/api/jobs/{job_id}`.
//!
//! 2.  **Inspect**: `GET` returns the summary of the last run: certificate count,
//!     filenames, row errors and the live delivery summary. `GET /{filename}`
//!     returns one certificate for preview.
//!
//! 3.  **Download**: `GET /archive` returns every certificate as `certificates.zip`.
//!
//! A new run replaces the previous one, together with its QR pass and delivery
//! records.

mod archive;
mod certificate;
mod start;
mod summary;

use actix_web::web;

const API_PATH: &str = "/api/sessions/{session_id}/batch";

/// Configures and returns the Actix `Scope` for all batch-related routes.
///
/// `/archive` is registered before `/{filename}` so that it is not read as a
/// certificate name.
pub fn configure_routes() -> actix_web::Scope {
    web::scope(API_PATH)
        .route("/start", web::post().to(start::process))
        .route("", web::get().to(summary::process))
        .route("/archive", web::get().to(archive::process))
        .route("/{filename}", web::get().to(certificate::process))
}
