//! Submit endpoint handlers.
//!
//! A submission is handled start to finish inside one request:
//! 1. Check the webhook URL is configured
//! 2. Buffer and reshape the multipart form
//! 3. Forward it to Discord and relay the outcome

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ProxyError, ProxyResponse};
use crate::submission::{InboundForm, OutboundSubmission};
use crate::upstream::forward_submission;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Client,
}

impl AppState {
    pub fn new(config: Config, client: Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Submit
// =============================================================================

/// CORS preflight. The headers come from the route's CORS middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Submission endpoint.
///
/// The configuration check runs before the body is touched, so a missing
/// webhook URL fails every request the same way.
pub async fn submit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProxyResponse>, ProxyError> {
    let Some(webhook_url) = state.config.discord_webhook_url.as_deref() else {
        warn!("submission_rejected_webhook_unconfigured");
        return Err(ProxyError::MissingWebhookUrl);
    };

    let multipart = multipart.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "submission_not_multipart");
        ProxyError::InvalidForm(rejection.body_text())
    })?;

    let form = InboundForm::read(multipart).await?;
    info!(field_count = form.len(), "submission_received");

    let submission = OutboundSubmission::from_form(&form)?;

    forward_submission(&state.client, webhook_url, submission).await?;

    info!("submission_forwarded");

    Ok(Json(ProxyResponse::success()))
}
