//! Batch summary. Row errors and filenames come from the run itself; the delivery
//! counts are read live from the session so they follow later send passes.

use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::batch::BatchSummary;

/// `GET /api/sessions/{session_id}/batch`
///
/// The summary of the last batch run, with delivery counts kept up to date by
/// later send passes.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
) -> impl Responder {
    let result = sessions
        .read(&session_id, |session| {
            let batch = session.require_batch()?;
            Ok(BatchSummary {
                deliveries: session.deliveries.summary(),
                ..batch.summary.clone()
            })
        })
        .await;

    match result {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => e.error_response(),
    }
}
