//! # Delivery Job
//!
//! `POST /api/sessions/{session_id}/delivery/send_all` and, through
//! [`schedule_delivery_job`], `POST .../delivery/retry`.
//!
//! ## Workflow:
//!
//! 1.  **Job Scheduling**: the session is claimed for a new job. The credentials, a
//!     copy of the delivery index and the message are snapshotted and the `job_id`
//!     is returned right away.
//!
//! 2.  **Background Processing**: the orchestrator walks the copied index on the
//!     blocking pool, pausing between attempts and honouring the session's cancel
//!     flag. Once a QR pass has run, the QR-stamped certificates are attached; a
//!     file the pass could not stamp goes out in its plain version.
//!
//! 3.  **Publication**: the updated index and the pass report are written back to
//!     the session; every failure also lands in the session's error log.

use crate::config::Config;
use crate::delivery::{AttachmentSource, Credentials, DeliveryOrchestrator, DeliveryService, MessageTemplate, SmtpMailer};
use crate::error::SessionError;
use crate::job_controller::state::{schedule_job, JobsState, ProgressReporter};
use crate::services::finish_job;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::delivery::DeliveryIndex;
use common::requests::SendAllRequest;

/// Which records a pass attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeliveryPass {
    /// Everything not yet sent.
    All,
    /// Only records marked failed.
    Retry,
}

struct DeliveryJob {
    credentials: Credentials,
    index: DeliveryIndex,
    message: MessageTemplate,
    attachments: AttachmentSource,
}

/// `POST /api/sessions/{session_id}/delivery/send_all`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    jobs: web::Data<JobsState>,
    config: web::Data<Config>,
    payload: web::Json<SendAllRequest>,
) -> impl Responder {
    let req = payload.into_inner();
    let message = MessageTemplate::new(req.subject, req.body);
    match schedule_delivery_job(&session_id, &sessions, &jobs, &config, DeliveryPass::All, Some(message)).await {
        Ok(job_id) => HttpResponse::Accepted().json(serde_json::json!({ "job_id": job_id })),
        Err(e) => e.error_response(),
    }
}

/// Starts a delivery pass. Without an explicit `message` the last one used in the
/// session is reused, or the default certificate message when there is none.
pub(super) async fn schedule_delivery_job(
    session_id: &str,
    sessions: &SessionsState,
    jobs: &JobsState,
    config: &Config,
    pass: DeliveryPass,
    message: Option<MessageTemplate>,
) -> Result<String, SessionError> {
    let (job_id, cancel, job) = sessions
        .begin_job(session_id, jobs, |session| {
            session.require_batch()?;
            let credentials = session.require_credentials()?;
            let message = message
                .or_else(|| session.last_message.clone())
                .unwrap_or_default();
            if pass == DeliveryPass::All {
                session.last_message = Some(message.clone());
            }
            Ok(DeliveryJob {
                credentials,
                index: session.deliveries.clone(),
                message,
                attachments: session.attachment_source(),
            })
        })
        .await?;

    let orchestrator = DeliveryOrchestrator::new(
        DeliveryService::new(SmtpMailer::new(config.smtp.clone())),
        config.send_delay,
        cancel,
    );
    let sessions = sessions.clone();
    let session_id = session_id.to_string();
    schedule_job(jobs, job_id.clone(), move |progress| {
        let result = delivery_blocking(&sessions, &session_id, &orchestrator, pass, job, progress);
        finish_job(&sessions, &session_id, result)
    });
    Ok(job_id)
}

fn delivery_blocking(
    sessions: &SessionsState,
    session_id: &str,
    orchestrator: &DeliveryOrchestrator<SmtpMailer>,
    pass: DeliveryPass,
    job: DeliveryJob,
    progress: &ProgressReporter,
) -> Result<String, SessionError> {
    let DeliveryJob {
        credentials,
        mut index,
        message,
        attachments,
    } = job;
    let report_progress = |percent| progress.report(percent);

    let report = match pass {
        DeliveryPass::All => {
            orchestrator.send_all(&credentials, &mut index, &message, &attachments, report_progress)
        }
        DeliveryPass::Retry => {
            orchestrator.retry_failed(&credentials, &mut index, &message, &attachments, report_progress)
        }
    };

    let mut outcome = format!(
        "{} of {} emails sent, {} failed",
        report.sent, report.attempted, report.failed
    );
    if report.cancelled {
        outcome.push_str(", cancelled");
    }
    if let Some(reason) = &report.aborted {
        outcome.push_str(&format!(", stopped: {}", reason));
    }

    sessions.blocking_update(session_id, move |session| {
        for failure in &report.failures {
            session.record_error(format!(
                "Failed to send email to {}: {}",
                failure.recipient, failure.reason
            ));
        }
        session.deliveries = index;
        session.last_report = Some(report);
        Ok(())
    })?;
    Ok(outcome)
}

