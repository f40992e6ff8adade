use crate::error::SessionError;
use crate::render::{encode_png, Renderer};
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/sessions/{session_id}/template/preview`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    renderer: web::Data<Renderer>,
) -> impl Responder {
    match render_preview(&session_id, &sessions, renderer.into_inner()).await {
        Ok(png) => HttpResponse::Ok().content_type("image/png").body(png),
        Err(e) => e.error_response(),
    }
}

async fn render_preview(
    session_id: &str,
    sessions: &SessionsState,
    renderer: std::sync::Arc<Renderer>,
) -> Result<Vec<u8>, SessionError> {
    let (template, elements) = sessions
        .read(session_id, |session| {
            Ok((session.require_template()?, session.layout.elements().to_vec()))
        })
        .await?;

    web::block(move || {
        let image = renderer.render_preview(&template, &elements)?;
        encode_png(&image)
    })
    .await?
    .map_err(SessionError::from)
}
