//! # Delivery Service Module
//!
//! Emailing of generated certificates, under `/api/sessions/{session_id}/delivery`.
//!
//! ## Workflow:
//!
//! 1. `PUT /credentials` stores the sender account in the session (memory only).
//! 2. `POST /test_connection` logs in once without sending anything.
//! 3. `POST /test_email` sends a sample certificate (every field filled with
//!    `Sample {field}`) to a single address.
//! 4. `POST /send_all` starts a job emailing every certificate not yet sent.
//! 5. `POST /retry` starts a job re-sending only the failed ones.
//! 6. `GET /` returns every delivery record, the per-status counts and the report
//!    of the last pass.
//!
//! SMTP calls block, so everything that talks to the server runs off the async
//! runtime.

mod credentials;
mod report;
mod retry;
mod send_all;
mod test_connection;
mod test_email;

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/sessions/{session_id}/delivery";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/credentials", put().to(credentials::process))
        .route("/test_connection", post().to(test_connection::process))
        .route("/test_email", post().to(test_email::process))
        .route("/send_all", post().to(send_all::process))
        .route("/retry", post().to(retry::process))
        .route("", get().to(report::process))
}
