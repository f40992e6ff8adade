use crate::config::Config;
use crate::delivery::{DeliveryService, SmtpMailer};
use crate::error::SessionError;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `POST /api/sessions/{session_id}/delivery/test_connection`
///
/// 200 when the server accepted the login, 401 when it refused the credentials.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    config: web::Data<Config>,
) -> impl Responder {
    match test_connection(&session_id, &sessions, &config).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "connected": true })),
        Err(e) => e.error_response(),
    }
}

async fn test_connection(
    session_id: &str,
    sessions: &SessionsState,
    config: &Config,
) -> Result<(), SessionError> {
    let credentials = sessions
        .read(session_id, |session| session.require_credentials())
        .await?;
    let service = DeliveryService::new(SmtpMailer::new(config.smtp.clone()));

    web::block(move || service.test_connection(&credentials))
        .await??;
    Ok(())
}
