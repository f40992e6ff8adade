//! Job status polling.
//!
//! - `GET /api/jobs/{job_id}`: returns the current `JobStatus` (`Pending`,
//!   `InProgress(percent)`, `Completed(message)` or `Failed(reason)`) of any job
//!   started by the batch, QR or delivery endpoints.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod get_status;

const API_PATH: &str = "/api/jobs";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{job_id}", get().to(get_status::process))
}
