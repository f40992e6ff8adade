use super::send_all::{schedule_delivery_job, DeliveryPass};
use crate::config::Config;
use crate::job_controller::state::JobsState;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `POST /api/sessions/{session_id}/delivery/retry`
///
/// Re-sends only the failed records, with the message of the last send pass.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    jobs: web::Data<JobsState>,
    config: web::Data<Config>,
) -> impl Responder {
    match schedule_delivery_job(&session_id, &sessions, &jobs, &config, DeliveryPass::Retry, None).await {
        Ok(job_id) => HttpResponse::Accepted().json(serde_json::json!({ "job_id": job_id })),
        Err(e) => e.error_response(),
    }
}
