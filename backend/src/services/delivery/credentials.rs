//! # Sender Credentials
//!
//! `PUT /api/sessions/{session_id}/delivery/credentials` stores the sender address
//! and app password for this session. They are held in memory only, never written
//! to disk, and dropped with the session. Malformed input is rejected here so that
//! a delivery pass never starts with credentials that cannot work.

use crate::delivery::{validate_credentials, Credentials};
use crate::error::SessionError;
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::CredentialsRequest;
use log::info;

/// Validates and stores the sender credentials.
///
/// # Arguments
/// * `session_id` - The session, extracted from the URL path.
/// * `payload` - A `CredentialsRequest` with `address` and `password`.
///
/// # Returns
/// - `200 OK` with the stored sender address. The password is never echoed.
/// - `400 Bad Request` if the address is malformed or the password is empty.
/// - `404 Not Found` if the session does not exist.
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    payload: web::Json<CredentialsRequest>,
) -> impl Responder {
    match store_credentials(&session_id, &sessions, payload.into_inner()).await {
        Ok(address) => HttpResponse::Ok().json(serde_json::json!({ "address": address })),
        Err(e) => e.error_response(),
    }
}

async fn store_credentials(
    session_id: &str,
    sessions: &SessionsState,
    req: CredentialsRequest,
) -> Result<String, SessionError> {
    let credentials = Credentials::new(req.address.trim(), req.password);
    validate_credentials(&credentials)?;

    let address = credentials.address.clone();
    sessions
        .update(session_id, |session| {
            session.credentials = Some(credentials);
            Ok(())
        })
        .await?;
    info!("[session {}] sender set to {}", session_id, address);
    Ok(address)
}
