//! # Field Layout Service
//!
//! Placement of data-bound text fields on the session's template, under
//! `/api/sessions/{session_id}/fields`. Positions are percentages of the template
//! size, so a layout survives a template swap.
//!
//! ## Workflow:
//!
//! 1. `POST` adds a field bound to a dataset column, centered on the template.
//! 2. `PUT /{field_id}` moves or restyles it. Dragging in a client maps to this call
//!    with new `x_pct`/`y_pct` values, which are clamped into `[0, 100]`.
//! 3. `DELETE /{field_id}` removes it.
//! 4. `GET` returns the whole layout with pixel positions resolved against the
//!    current template.

mod add;
mod list;
mod remove;
mod update;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/sessions/{session_id}/fields";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(add::process))
        .route("/{field_id}", put().to(update::process))
        .route("/{field_id}", delete().to(remove::process))
}
