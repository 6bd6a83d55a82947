//! Request-level errors and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Fallback message for transport failures that carry no text.
pub const TRANSPORT_FALLBACK_MESSAGE: &str = "Webhook request failed";

/// Body returned for every JSON response of the submit endpoint.
#[derive(Debug, Serialize)]
pub struct ProxyResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyResponse {
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

/// Everything that can end a submission early.
///
/// None of these are retried.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream webhook URL is not configured.
    #[error("Missing DISCORD_WEBHOOK_URL")]
    MissingWebhookUrl,

    /// The body could not be read as a multipart form.
    #[error("{0}")]
    InvalidForm(String),

    /// The body exceeded the route's byte limit while being read.
    #[error("Request body too large")]
    RequestTooLarge,

    /// No usable `payload_json` field.
    #[error("payload_json missing")]
    MissingPayload,

    /// Attachments summed past the ceiling.
    #[error("Attachments too large (>25MB)")]
    AttachmentsTooLarge,

    /// The webhook answered with a non-success status.
    #[error("Discord webhook error: {code}\n{body}", code = .status.as_u16())]
    Upstream { status: StatusCode, body: String },

    /// The webhook could not be reached.
    #[error("{0}")]
    Transport(String),
}

impl ProxyError {
    /// Build a transport error, substituting the fallback for empty messages.
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self::Transport(TRANSPORT_FALLBACK_MESSAGE.to_string())
        } else {
            Self::Transport(message)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingWebhookUrl | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidForm(_) | Self::MissingPayload => StatusCode::BAD_REQUEST,
            Self::RequestTooLarge | Self::AttachmentsTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // Upstream failures are relayed as plain text, not JSON.
            Self::Upstream { .. } => (status, self.to_string()).into_response(),
            _ => (status, Json(ProxyResponse::failure(self.to_string()))).into_response(),
        }
    }
}
