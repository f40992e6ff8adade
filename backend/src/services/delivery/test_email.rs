//! # Test Email
//!
//! `POST /api/sessions/{session_id}/delivery/test_email` sends one message to an
//! address of the user's choice, with the preview certificate (every field filled
//! with sample text) attached. It exercises the whole delivery path, SMTP login
//! included, without touching the session's delivery records.

use crate::config::Config;
use crate::delivery::{DeliveryService, SmtpMailer};
use crate::error::SessionError;
use crate::render::{encode_png, Renderer};
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::TestEmailRequest;
use log::info;
use std::io::Write;
use std::sync::Arc;

/// `POST /api/sessions/{session_id}/delivery/test_email`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    renderer: web::Data<Renderer>,
    config: web::Data<Config>,
    payload: web::Json<TestEmailRequest>,
) -> impl Responder {
    let result = send_test_email(
        &session_id,
        &sessions,
        renderer.into_inner(),
        &config,
        payload.into_inner(),
    )
    .await;

    match result {
        Ok(recipient) => HttpResponse::Ok().json(serde_json::json!({ "sent_to": recipient })),
        Err(e) => e.error_response(),
    }
}

/// Renders the preview certificate into a temporary file, attaches it and sends
/// it. The file is removed once the message is out.
async fn send_test_email(
    session_id: &str,
    sessions: &SessionsState,
    renderer: Arc<Renderer>,
    config: &Config,
    req: TestEmailRequest,
) -> Result<String, SessionError> {
    let (credentials, template, elements) = sessions
        .read(session_id, |session| {
            Ok((
                session.require_credentials()?,
                session.require_template()?,
                session.layout.elements().to_vec(),
            ))
        })
        .await?;
    let service = DeliveryService::new(SmtpMailer::new(config.smtp.clone()));

    let recipient = req.recipient.trim().to_string();
    let sent_to = recipient.clone();
    web::block(move || -> Result<(), SessionError> {
        let preview = encode_png(&renderer.render_preview(&template, &elements)?)?;
        let mut file = tempfile::Builder::new()
            .prefix("certificate_preview_")
            .suffix(".png")
            .tempfile()?;
        file.write_all(&preview)?;
        file.flush()?;

        service.send(&credentials, &recipient, &req.subject, &req.body, Some(file.path()))?;
        Ok(())
    })
    .await??;

    info!("[session {}] test email sent to {}", session_id, sent_to);
    Ok(sent_to)
}
