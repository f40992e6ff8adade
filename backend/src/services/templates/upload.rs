use crate::error::SessionError;
use crate::render::Template;
use crate::services::read_file_part;
use crate::session::SessionsState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::info;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TemplateInfo {
    width: u32,
    height: u32,
}

/// `POST /api/sessions/{session_id}/template`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    payload: Multipart,
) -> impl Responder {
    match upload_template(&session_id, &sessions, payload).await {
        Ok(info) => HttpResponse::Ok().json(info),
        Err(e) => e.error_response(),
    }
}

async fn upload_template(
    session_id: &str,
    sessions: &SessionsState,
    payload: Multipart,
) -> Result<TemplateInfo, SessionError> {
    let upload = read_file_part(payload).await?;
    let template = web::block(move || Template::decode(&upload.bytes))
        .await??;

    let info = TemplateInfo {
        width: template.width(),
        height: template.height(),
    };
    sessions
        .update(session_id, |session| {
            session.set_template(template);
            Ok(())
        })
        .await?;

    info!(
        "[session {}] template set ({}x{})",
        session_id, info.width, info.height
    );
    Ok(info)
}
