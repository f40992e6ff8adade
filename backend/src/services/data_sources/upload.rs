use crate::dataset::{fingerprint, load_dataset};
use crate::error::SessionError;
use crate::services::read_file_part;
use crate::session::SessionsState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::info;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DatasetInfo {
    headers: Vec<String>,
    rows: usize,
    fingerprint: String,
    /// The same bytes were already loaded in this session.
    unchanged: bool,
    email_column: Option<String>,
}

/// HTTP handler wrapper that converts the internal result to an `HttpResponse`.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    payload: Multipart,
) -> impl Responder {
    match upload_dataset(&session_id, &sessions, payload).await {
        Ok(info) => HttpResponse::Ok().json(info),
        Err(e) => {
            let _ = sessions
                .update(&session_id, |s| {
                    s.record_error(format!("Dataset upload failed: {}", e));
                    Ok(())
                })
                .await;
            e.error_response()
        }
    }
}

async fn upload_dataset(
    session_id: &str,
    sessions: &SessionsState,
    payload: Multipart,
) -> Result<DatasetInfo, SessionError> {
    let upload = read_file_part(payload).await?;
    if upload.filename.is_empty() {
        return Err(SessionError::BadRequest(
            "the uploaded file has no name".to_string(),
        ));
    }

    let digest = fingerprint(&upload.bytes);
    let dataset = web::block(move || load_dataset(&upload.filename, &upload.bytes))
        .await??;

    let headers = dataset.headers.clone();
    let rows = dataset.len();
    let (unchanged, email_column) = sessions
        .update(session_id, |session| {
            let unchanged = session.set_dataset(dataset, digest.clone());
            Ok((unchanged, session.email_column.clone()))
        })
        .await?;

    info!(
        "[session {}] dataset loaded: {} columns, {} rows (md5 {})",
        session_id,
        headers.len(),
        rows,
        digest
    );
    Ok(DatasetInfo {
        headers,
        rows,
        fingerprint: digest,
        unchanged,
        email_column,
    })
}
