//! Selection, ordering and size accounting for `files[N]` attachments.

use std::cmp::Ordering;

use axum::body::Bytes;
use tracing::warn;

use super::form::{FormValue, InboundForm};
use crate::error::ProxyError;

/// Upper bound on the summed size of all forwarded attachments (25 MiB).
pub const MAX_TOTAL_ATTACHMENT_BYTES: usize = 25 * 1024 * 1024;

/// Filename used when an upload arrives without one.
pub const FALLBACK_FILENAME: &str = "upload.png";

/// Content type used when an upload arrives without one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// An attachment accepted for forwarding.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Original form key, e.g. `files[3]`.
    pub key: String,
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Return the digit run of a `files[<digits>]` key.
///
/// Anything else (empty brackets, signs, whitespace, trailing text,
/// non-ASCII digits) yields `None`.
pub fn attachment_index(key: &str) -> Option<&str> {
    let digits = key.strip_prefix("files[")?.strip_suffix(']')?;
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

/// Compare two digit strings by numeric value, without a width limit.
fn compare_indices(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Matching attachment keys sorted by numeric index.
///
/// Every entry contributes its key, so a key sent twice appears twice. The
/// sort is stable, so keys of equal value (`files[1]`, `files[01]`, or a
/// repeated key) keep their inbound order.
pub fn ordered_attachment_keys(form: &InboundForm) -> Vec<&str> {
    let mut keys: Vec<(&str, &str)> = form
        .keys()
        .filter_map(|key| attachment_index(key).map(|index| (key, index)))
        .collect();

    keys.sort_by(|(_, a), (_, b)| compare_indices(a, b));
    keys.into_iter().map(|(key, _)| key).collect()
}

/// Walk the ordered keys and collect file attachments.
///
/// Fails with [`ProxyError::AttachmentsTooLarge`] as soon as the running
/// total passes `limit`; nothing collected so far is returned. Text values
/// under a matching key are skipped and not counted. Each key resolves to
/// the first value sent under it, so a repeated key forwards and counts that
/// value once per occurrence.
pub fn collect_attachments(form: &InboundForm, limit: usize) -> Result<Vec<Attachment>, ProxyError> {
    let mut total: usize = 0;
    let mut attachments = Vec::new();

    for key in ordered_attachment_keys(form) {
        let Some(FormValue::File {
            data,
            filename,
            content_type,
        }) = form.get(key)
        else {
            continue;
        };

        total = total.saturating_add(data.len());
        if total > limit {
            warn!(
                key = key,
                total_bytes = total,
                limit_bytes = limit,
                "attachments_too_large"
            );
            return Err(ProxyError::AttachmentsTooLarge);
        }

        attachments.push(Attachment {
            key: key.to_string(),
            filename: if filename.is_empty() {
                FALLBACK_FILENAME.to_string()
            } else {
                filename.clone()
            },
            content_type: content_type
                .as_deref()
                .filter(|ct| !ct.is_empty())
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string(),
            data: data.clone(),
        });
    }

    Ok(attachments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_of_len(len: usize, filename: &str) -> FormValue {
        FormValue::File {
            data: Bytes::from(vec![0u8; len]),
            filename: filename.to_string(),
            content_type: Some("image/png".to_string()),
        }
    }

    #[test]
    fn test_attachment_index_matches() {
        assert_eq!(attachment_index("files[0]"), Some("0"));
        assert_eq!(attachment_index("files[10]"), Some("10"));
        assert_eq!(attachment_index("files[007]"), Some("007"));
    }

    #[test]
    fn test_attachment_index_rejects_malformed() {
        for key in [
            "files[]",
            "files[a]",
            "files[-1]",
            "files[ 1]",
            "files[1]x",
            "xfiles[1]",
            "files1",
            "file[1]",
            "files[1][2]",
            "Files[1]",
            "files[١]",
            "payload_json",
        ] {
            assert_eq!(attachment_index(key), None, "{key} should not match");
        }
    }

    #[test]
    fn test_ordering_is_numeric_not_lexicographic() {
        let mut form = InboundForm::new();
        form.push("files[10]", file_of_len(1, "ten"));
        form.push("files[2]", file_of_len(1, "two"));
        form.push("note", FormValue::Text("ignored".to_string()));
        form.push("files[1]", file_of_len(1, "one"));

        assert_eq!(
            ordered_attachment_keys(&form),
            vec!["files[1]", "files[2]", "files[10]"]
        );
    }

    #[test]
    fn test_ordering_handles_indices_wider_than_u64() {
        let mut form = InboundForm::new();
        form.push("files[99999999999999999999999]", file_of_len(1, "huge"));
        form.push("files[3]", file_of_len(1, "small"));
        form.push("files[0000000000000000000000004]", file_of_len(1, "padded"));

        assert_eq!(
            ordered_attachment_keys(&form),
            vec![
                "files[3]",
                "files[0000000000000000000000004]",
                "files[99999999999999999999999]"
            ]
        );
    }

    #[test]
    fn test_equal_indices_keep_inbound_order() {
        let mut form = InboundForm::new();
        form.push("files[01]", file_of_len(1, "padded"));
        form.push("files[1]", file_of_len(1, "plain"));
        form.push("files[0]", file_of_len(1, "zero"));

        assert_eq!(
            ordered_attachment_keys(&form),
            vec!["files[0]", "files[01]", "files[1]"]
        );
    }

    #[test]
    fn test_collect_skips_text_values_and_defaults_filename() {
        let mut form = InboundForm::new();
        form.push("files[1]", FormValue::Text("not a file".to_string()));
        form.push("files[0]", file_of_len(3, ""));
        form.push("files[2]", file_of_len(2, "photo.jpg"));

        let attachments = collect_attachments(&form, MAX_TOTAL_ATTACHMENT_BYTES).unwrap();

        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].key, "files[0]");
        assert_eq!(attachments[0].filename, FALLBACK_FILENAME);
        assert_eq!(attachments[1].key, "files[2]");
        assert_eq!(attachments[1].filename, "photo.jpg");
        assert_eq!(attachments[1].content_type, "image/png");
    }

    #[test]
    fn test_duplicate_keys_forward_first_value_per_occurrence() {
        let mut form = InboundForm::new();
        form.push("files[1]", file_of_len(1, "later.txt"));
        form.push("files[0]", file_of_len(1, "first.txt"));
        form.push("files[0]", file_of_len(2, "second.txt"));

        let attachments = collect_attachments(&form, MAX_TOTAL_ATTACHMENT_BYTES).unwrap();
        let names: Vec<(&str, &str)> = attachments
            .iter()
            .map(|a| (a.key.as_str(), a.filename.as_str()))
            .collect();

        assert_eq!(
            names,
            vec![
                ("files[0]", "first.txt"),
                ("files[0]", "first.txt"),
                ("files[1]", "later.txt"),
            ]
        );
    }

    #[test]
    fn test_duplicate_keys_count_toward_limit_each_time() {
        let mut form = InboundForm::new();
        form.push("files[0]", file_of_len(6, "first.txt"));
        form.push("files[0]", file_of_len(1, "second.txt"));

        // 6 + 6, not 6 + 1.
        let result = collect_attachments(&form, 10);
        assert!(matches!(result, Err(ProxyError::AttachmentsTooLarge)));
    }

    #[test]
    fn test_missing_content_type_defaults_to_octet_stream() {
        let mut form = InboundForm::new();
        form.push(
            "files[0]",
            FormValue::File {
                data: Bytes::from_static(b"raw"),
                filename: "blob".to_string(),
                content_type: None,
            },
        );
        form.push(
            "files[1]",
            FormValue::File {
                data: Bytes::from_static(b"raw"),
                filename: "blob".to_string(),
                content_type: Some(String::new()),
            },
        );

        let attachments = collect_attachments(&form, MAX_TOTAL_ATTACHMENT_BYTES).unwrap();
        assert_eq!(attachments[0].content_type, FALLBACK_CONTENT_TYPE);
        assert_eq!(attachments[1].content_type, FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_collect_scales_to_many_attachments() {
        let mut form = InboundForm::new();
        form.push("payload_json", FormValue::Text("{}".to_string()));
        for i in (0..100_000).rev() {
            form.push(format!("files[{i}]"), file_of_len(0, "empty"));
        }

        let attachments = collect_attachments(&form, MAX_TOTAL_ATTACHMENT_BYTES).unwrap();
        assert_eq!(attachments.len(), 100_000);
        assert_eq!(attachments[0].key, "files[0]");
        assert_eq!(attachments[99_999].key, "files[99999]");
    }

    #[test]
    fn test_total_at_limit_is_accepted() {
        let mut form = InboundForm::new();
        form.push("files[0]", file_of_len(6, "a"));
        form.push("files[1]", file_of_len(4, "b"));

        let attachments = collect_attachments(&form, 10).unwrap();
        assert_eq!(attachments.len(), 2);
    }

    #[test]
    fn test_total_over_limit_is_rejected() {
        let mut form = InboundForm::new();
        form.push("files[0]", file_of_len(6, "a"));
        form.push("files[1]", file_of_len(5, "b"));

        let result = collect_attachments(&form, 10);
        assert!(matches!(result, Err(ProxyError::AttachmentsTooLarge)));
    }

    #[test]
    fn test_text_values_do_not_count_toward_limit() {
        let mut form = InboundForm::new();
        form.push("files[0]", FormValue::Text("x".repeat(64)));
        form.push("files[1]", file_of_len(10, "b"));

        let attachments = collect_attachments(&form, 10).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].key, "files[1]");
    }

    #[test]
    fn test_no_attachments() {
        let mut form = InboundForm::new();
        form.push("payload_json", FormValue::Text("{}".to_string()));

        assert!(collect_attachments(&form, MAX_TOTAL_ATTACHMENT_BYTES)
            .unwrap()
            .is_empty());
    }
}
