//! # Batch Job Start Service
//!
//! This module provides the `POST /api/sessions/{session_id}/batch/start` endpoint,
//! which renders one certificate per dataset row in the background.
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: The `process` handler receives the session id from the path.
//!
//! 2.  **Job Scheduling**: `schedule_batch_job` claims the session for a new job.
//!     It checks that a template, a dataset and at least one field are present,
//!     snapshots them, registers a `Pending` job and immediately returns the `job_id`
//!     so the client can poll `GET /api/jobs/{job_id}`.
//!
//! 3.  **Background Processing**: `batch_blocking` runs on the blocking pool. It renders
//!     every row through the batch pipeline, reporting progress after each one.
//!
//! 4.  **Persistence**: Certificates are written to the session's `certificates/`
//!     directory (replacing the previous run) and packed into `certificates.zip`.
//!
//! 5.  **Publication**: The summary, the archive and the fresh delivery index are
//!     stored in the session. Results of an earlier QR pass or delivery pass are
//!     discarded since they refer to the old certificates.

use crate::batch::{run_batch, BatchInput};
use crate::cancel::CancelFlag;
use crate::error::SessionError;
use crate::job_controller::state::{schedule_job, JobsState, ProgressReporter};
use crate::render::{Renderer, Template};
use crate::services::finish_job;
use crate::session::{BatchRun, SessionsState};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::field::FieldElement;
use common::model::participant::Dataset;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Snapshot of the session taken when the job starts.
struct BatchJob {
    template: Arc<Template>,
    dataset: Arc<Dataset>,
    elements: Vec<FieldElement>,
    email_column: Option<String>,
    out_dir: PathBuf,
}

/// The Actix web handler for `POST /api/sessions/{session_id}/batch/start`.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    jobs: web::Data<JobsState>,
    renderer: web::Data<Renderer>,
) -> impl Responder {
    match schedule_batch_job(&session_id, &sessions, &jobs, renderer.into_inner()).await {
        Ok(job_id) => HttpResponse::Accepted().json(serde_json::json!({ "job_id": job_id })),
        Err(e) => e.error_response(),
    }
}

async fn schedule_batch_job(
    session_id: &str,
    sessions: &SessionsState,
    jobs: &JobsState,
    renderer: Arc<Renderer>,
) -> Result<String, SessionError> {
    let (job_id, cancel, job) = sessions
        .begin_job(session_id, jobs, |session| {
            let template = session.require_template()?;
            let dataset = session.require_dataset()?;
            if session.layout.is_empty() {
                return Err(SessionError::MissingFields);
            }
            Ok(BatchJob {
                template,
                dataset,
                elements: session.layout.elements().to_vec(),
                email_column: session.email_column.clone(),
                out_dir: session.certificates_dir(),
            })
        })
        .await?;

    let sessions = sessions.clone();
    let session_id = session_id.to_string();
    schedule_job(jobs, job_id.clone(), move |progress| {
        let result = batch_blocking(&sessions, &session_id, &renderer, job, &cancel, progress);
        finish_job(&sessions, &session_id, result)
    });
    Ok(job_id)
}

/// The synchronous body of the batch job, run via `spawn_blocking`.
fn batch_blocking(
    sessions: &SessionsState,
    session_id: &str,
    renderer: &Renderer,
    job: BatchJob,
    cancel: &CancelFlag,
    progress: &ProgressReporter,
) -> Result<String, SessionError> {
    let input = BatchInput {
        template: &job.template,
        dataset: &job.dataset,
        elements: &job.elements,
        email_column: job.email_column.as_deref(),
    };
    let output = run_batch(renderer, &input, cancel, |percent| progress.report(percent));

    if job.out_dir.exists() {
        fs::remove_dir_all(&job.out_dir)?;
    }
    output.persist(&job.out_dir)?;
    let archive = output.archive()?;
    let summary = output.summary();

    let message = format!(
        "{} certificates generated from {} rows ({} errors){}",
        summary.certificates,
        summary.total_rows,
        summary.errors.len(),
        if summary.cancelled { ", cancelled" } else { "" }
    );

    sessions.blocking_update(session_id, move |session| {
        for error in &summary.errors {
            session.record_error(error.message.clone());
        }
        session.deliveries = output.deliveries;
        session.batch = Some(BatchRun {
            summary,
            archive: Arc::new(archive),
        });
        session.qr = None;
        session.last_report = None;
        Ok(())
    })?;

    Ok(message)
}
