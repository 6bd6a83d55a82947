//! Submission reshaping.
//!
//! Turns an [`InboundForm`] into the [`OutboundSubmission`] sent to the
//! webhook.
//!
//! ## Flow
//!
//! ```text
//! InboundForm → payload_json text + ordered files[N] → OutboundSubmission → multipart Form
//! ```

pub mod attachments;
pub mod form;

use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use crate::error::ProxyError;

pub use attachments::{
    attachment_index, collect_attachments, ordered_attachment_keys, Attachment,
    FALLBACK_CONTENT_TYPE, FALLBACK_FILENAME, MAX_TOTAL_ATTACHMENT_BYTES,
};
pub use form::{FormValue, InboundForm};

/// Name of the required JSON payload field.
pub const PAYLOAD_FIELD: &str = "payload_json";

/// What gets forwarded upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundSubmission {
    pub payload_json: String,
    /// Attachments in ascending index order.
    pub attachments: Vec<Attachment>,
}

impl OutboundSubmission {
    /// Validate and reshape an inbound form.
    pub fn from_form(form: &InboundForm) -> Result<Self, ProxyError> {
        let payload_json = payload_text(form)?;
        let attachments = collect_attachments(form, MAX_TOTAL_ATTACHMENT_BYTES)?;

        let submission = Self {
            payload_json,
            attachments,
        };

        info!(
            payload_length = submission.payload_json.len(),
            attachment_count = submission.attachments.len(),
            attachment_bytes = submission.attachment_bytes(),
            "submission_prepared"
        );

        Ok(submission)
    }

    /// Total bytes across all attachments.
    pub fn attachment_bytes(&self) -> usize {
        self.attachments.iter().map(|a| a.data.len()).sum()
    }

    /// Build the outbound multipart body: `payload_json` first, then each
    /// attachment under its original key.
    pub fn into_form(self) -> Form {
        self.attachments.into_iter().fold(
            Form::new().text(PAYLOAD_FIELD, self.payload_json),
            |form, attachment| {
                let key = attachment.key.clone();
                form.part(key, attachment_part(attachment))
            },
        )
    }
}

fn attachment_part(attachment: Attachment) -> Part {
    let length = attachment.data.len() as u64;
    let untyped = || {
        Part::stream_with_length(attachment.data.clone(), length)
            .file_name(attachment.filename.clone())
    };

    untyped()
        .mime_str(&attachment.content_type)
        .or_else(|e| {
            warn!(
                key = %attachment.key,
                content_type = %attachment.content_type,
                error = %e,
                "attachment_content_type_invalid"
            );
            untyped().mime_str(FALLBACK_CONTENT_TYPE)
        })
        .unwrap_or_else(|_| untyped())
}

/// Extract `payload_json` as text.
///
/// A text value that is empty counts as missing. A file value is decoded as
/// UTF-8 and kept even when empty.
fn payload_text(form: &InboundForm) -> Result<String, ProxyError> {
    match form.get(PAYLOAD_FIELD) {
        Some(FormValue::Text(text)) if !text.is_empty() => Ok(text.clone()),
        Some(FormValue::File { data, .. }) => Ok(String::from_utf8_lossy(data).into_owned()),
        _ => {
            warn!(field_count = form.len(), "payload_json_missing");
            Err(ProxyError::MissingPayload)
        }
    }
}
