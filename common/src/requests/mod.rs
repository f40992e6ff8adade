//! JSON payloads accepted by the HTTP API.

use crate::model::field::Rgb;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFieldRequest {
    pub field_name: String,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailColumnRequest {
    /// `None` clears the email column.
    #[serde(default)]
    pub column: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartQrRequest {
    /// Overrides the configured validation base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Sender credentials; held in memory for the lifetime of the session only.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub address: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendAllRequest {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestEmailRequest {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Single certificate personalization: name and email text plus an optional photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalizeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Base64 encoded PNG/JPEG.
    #[serde(default)]
    pub photo_base64: Option<String>,
    #[serde(default)]
    pub photo_x: Option<u32>,
    #[serde(default)]
    pub photo_y: Option<u32>,
}
