//! Forwarding a prepared submission to the Discord webhook.

use axum::http::StatusCode;
use reqwest::Client;
use tracing;

use crate::error::ProxyError;
use crate::submission::OutboundSubmission;

/// POST the submission to `webhook_url` once.
///
/// No retries and no per-request timeout. On a non-success status the
/// upstream's status and body text are returned as [`ProxyError::Upstream`];
/// an unreadable body is treated as empty.
pub async fn forward_submission(
    client: &Client,
    webhook_url: &str,
    submission: OutboundSubmission,
) -> Result<(), ProxyError> {
    let attachment_count = submission.attachments.len();
    let attachment_bytes = submission.attachment_bytes();

    tracing::info!(
        attachment_count = attachment_count,
        attachment_bytes = attachment_bytes,
        "webhook_forward_starting"
    );

    let response = match client
        .post(webhook_url)
        .multipart(submission.into_form())
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            // The webhook token lives in the URL path.
            let e = e.without_url();
            if e.is_connect() {
                tracing::error!(error = %e, "webhook_forward_connect_error");
            } else if e.is_builder() {
                tracing::error!(error = %e, "webhook_forward_invalid_request");
            } else {
                tracing::error!(error = %e, "webhook_forward_failed");
            }
            return Err(ProxyError::transport(e.to_string()));
        }
    };

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        tracing::warn!(
            status_code = status.as_u16(),
            body_length = body.len(),
            "webhook_forward_rejected"
        );
        return Err(ProxyError::Upstream {
            status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            body,
        });
    }

    tracing::info!(
        status_code = status.as_u16(),
        attachment_count = attachment_count,
        "webhook_forward_complete"
    );

    Ok(())
}
