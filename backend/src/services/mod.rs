//! HTTP surface of the engine.
//!
//! Each submodule owns one `Scope` (built by its `configure_routes`) and keeps one
//! handler per file, each exposing a `process` function. Session-scoped routes
//! live under `/api/sessions/{session_id}/...`.

pub mod data_sources;
pub mod delivery;
pub mod fields;
pub mod jobs;
pub mod merge;
pub mod personalize;
pub mod qr;
pub mod sessions;
pub mod templates;

use crate::error::SessionError;
use crate::session::SessionsState;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Registers every scope.
///
/// A scope that matches a path prefix answers 404 for unknown sub-paths instead
/// of falling through, so the bare `/api/sessions` scope goes last.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(templates::configure_routes())
        .service(data_sources::configure_routes())
        .service(fields::configure_routes())
        .service(merge::configure_routes())
        .service(qr::configure_routes())
        .service(delivery::configure_routes())
        .service(personalize::configure_routes())
        .service(jobs::configure_routes())
        .service(sessions::configure_routes());
}

/// An uploaded file: client-side name and full contents.
pub(crate) struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Reads the multipart part named `file`; other parts are drained and ignored.
pub(crate) async fn read_file_part(mut payload: Multipart) -> Result<UploadedFile, SessionError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| SessionError::BadRequest(e.to_string()))?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| SessionError::BadRequest(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }

        if part_name.as_deref() == Some("file") {
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                .unwrap_or_default();
            debug!("Received upload '{}' ({} bytes)", filename, bytes.len());
            upload = Some(UploadedFile { filename, bytes });
        }
    }

    upload.ok_or_else(|| SessionError::BadRequest("missing multipart field 'file'".to_string()))
}

/// Turns a job's result into the job's final status, logging failures into the
/// session's error log on the way.
pub(crate) fn finish_job(
    sessions: &SessionsState,
    session_id: &str,
    result: Result<String, SessionError>,
) -> Result<String, String> {
    result.map_err(|e| {
        let message = e.to_string();
        let _ = sessions.blocking_update(session_id, |s| {
            s.record_error(message.clone());
            Ok(())
        });
        message
    })
}

/// An `application/zip` attachment response.
pub(crate) fn zip_response(filename: &str, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/zip")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .body(bytes)
}

/// Serves one stored certificate image.
///
/// Callers only pass names taken from the session's own run results, never a raw
/// client path, so `path` always stays inside the session directory.
pub(crate) async fn certificate_response(path: PathBuf) -> Result<HttpResponse, SessionError> {
    let content_type = mime_guess::from_path(&path).first_or_octet_stream().to_string();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let bytes = web::block(move || fs::read(path)).await?.map_err(|e| match e.kind() {
        ErrorKind::NotFound => SessionError::CertificateNotFound(name),
        _ => SessionError::Io(e),
    })?;
    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}
