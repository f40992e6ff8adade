use crate::error::SessionError;
use crate::render::{encode_png, Personalization, Renderer};
use crate::session::SessionsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::requests::PersonalizeRequest;
use std::sync::Arc;

/// `POST /api/sessions/{session_id}/personalize`
pub(crate) async fn process(
    session_id: web::Path<String>,
    sessions: web::Data<SessionsState>,
    renderer: web::Data<Renderer>,
    payload: web::Json<PersonalizeRequest>,
) -> impl Responder {
    match personalize(&session_id, &sessions, renderer.into_inner(), payload.into_inner()).await {
        Ok(png) => HttpResponse::Ok().content_type("image/png").body(png),
        Err(e) => e.error_response(),
    }
}

async fn personalize(
    session_id: &str,
    sessions: &SessionsState,
    renderer: Arc<Renderer>,
    req: PersonalizeRequest,
) -> Result<Vec<u8>, SessionError> {
    let template = sessions
        .read(session_id, |session| session.require_template())
        .await?;

    let photo = req
        .photo_base64
        .as_deref()
        .filter(|data| !data.trim().is_empty())
        .map(decode_photo)
        .transpose()?;
    let details = Personalization {
        name: req.name,
        email: req.email,
        photo,
        photo_x: req.photo_x,
        photo_y: req.photo_y,
    };

    web::block(move || {
        let image = renderer.personalize(&template, &details)?;
        encode_png(&image)
    })
    .await?
    .map_err(SessionError::from)
}

/// Decodes plain base64 or a `data:<mime>;base64,<payload>` URL.
fn decode_photo(data: &str) -> Result<Vec<u8>, SessionError> {
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| SessionError::BadRequest(format!("photo is not valid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_data_url_photos() {
        let encoded = BASE64.encode(b"\x89PNG");
        assert_eq!(decode_photo(&encoded).unwrap(), b"\x89PNG");
        assert_eq!(
            decode_photo(&format!("data:image/png;base64,{}", encoded)).unwrap(),
            b"\x89PNG"
        );
        assert!(matches!(decode_photo("%%%"), Err(SessionError::BadRequest(_))));
    }
}
