use crate::archive::archive_directory;
use crate::cancel::CancelFlag;
use crate::config::Config;
use crate::error::SessionError;
use crate::job_controller::state::{schedule_job, JobsState, ProgressReporter};
use crate::qr::QrAnnotator;
use crate::services::finish_job;
use crate::session::{QrRun, SessionsState};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::StartQrRequest;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

struct QrJob {
    filenames: Vec<String>,
    src_dir: PathBuf,
    out_dir: PathBuf,
    base_url: String,
}

/// `POST /api/sessions/{session_id}/qr/start`
///
/// The body is optional; `base_url` falls back to the configured validation URL.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    jobs: web::Data<JobsState>,
    config: web::Data<Config>,
    payload: Option<web::Json<StartQrRequest>>,
) -> impl Responder {
    let base_url = payload
        .and_then(|p| p.into_inner().base_url)
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| config.validation_base_url.clone());

    match schedule_qr_job(&session_id, &sessions, &jobs, base_url).await {
        Ok(job_id) => HttpResponse::Accepted().json(serde_json::json!({ "job_id": job_id })),
        Err(e) => e.error_response(),
    }
}

async fn schedule_qr_job(
    session_id: &str,
    sessions: &SessionsState,
    jobs: &JobsState,
    base_url: String,
) -> Result<String, SessionError> {
    let (job_id, cancel, job) = sessions
        .begin_job(session_id, jobs, |session| {
            let batch = session.require_batch()?;
            Ok(QrJob {
                filenames: batch.summary.filenames.clone(),
                src_dir: session.certificates_dir(),
                out_dir: session.qr_dir(),
                base_url,
            })
        })
        .await?;

    let sessions = sessions.clone();
    let session_id = session_id.to_string();
    schedule_job(jobs, job_id.clone(), move |progress| {
        let result = qr_blocking(&sessions, &session_id, job, &cancel, progress);
        finish_job(&sessions, &session_id, result)
    });
    Ok(job_id)
}

fn qr_blocking(
    sessions: &SessionsState,
    session_id: &str,
    job: QrJob,
    cancel: &CancelFlag,
    progress: &ProgressReporter,
) -> Result<String, SessionError> {
    if job.out_dir.exists() {
        fs::remove_dir_all(&job.out_dir)?;
    }

    let output = QrAnnotator::default()
        .annotate_directory(
            &job.src_dir,
            &job.filenames,
            &job.out_dir,
            &job.base_url,
            cancel,
            |percent| progress.report(percent),
        )?;
    let archive = archive_directory(&job.out_dir)?;

    let message = format!(
        "{} QR codes issued ({} failures)",
        output.issued.len(),
        output.errors.len()
    );
    sessions.blocking_update(session_id, move |session| {
        for error in &output.errors {
            session.record_error(format!("QR annotation failed for {}", error));
        }
        session.qr = Some(QrRun {
            output,
            archive: Arc::new(archive),
        });
        Ok(())
    })?;
    Ok(message)
}
