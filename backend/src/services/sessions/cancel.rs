//! Cooperative cancellation. The flag is raised at once, but a running job only
//! notices it between two rows, files or recipients; whatever it finished before
//! that point is kept.

use crate::job_controller::state::JobsState;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::info;

/// `POST /api/sessions/{session_id}/cancel`
///
/// Responds with the job that was asked to stop, if one was running.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    jobs: web::Data<JobsState>,
) -> impl Responder {
    let active = sessions
        .read(&session_id, |session| {
            session.cancel.cancel();
            Ok(session.active_job.clone())
        })
        .await;

    match active {
        Ok(active) => {
            let mut running = None;
            if let Some(job_id) = active {
                if jobs.is_running(&job_id).await {
                    info!("[session {}] cancelling job {}", session_id, job_id);
                    running = Some(job_id);
                }
            }
            HttpResponse::Ok().json(serde_json::json!({ "cancelled_job": running }))
        }
        Err(e) => e.error_response(),
    }
}
