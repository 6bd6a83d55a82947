//! Inbound multipart form, buffered into ordered entries.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::warn;

use crate::error::ProxyError;

/// A single form value: either plain text or an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        data: Bytes,
        /// Filename from the Content-Disposition header, possibly empty.
        filename: String,
        content_type: Option<String>,
    },
}

impl FormValue {
    /// Byte size counted against the attachment ceiling.
    pub fn file_size(&self) -> Option<usize> {
        match self {
            FormValue::File { data, .. } => Some(data.len()),
            FormValue::Text(_) => None,
        }
    }
}

/// All named parts of an inbound form, in the order they arrived.
///
/// Lookups return the first entry for a name.
#[derive(Debug, Clone, Default)]
pub struct InboundForm {
    entries: Vec<(String, FormValue)>,
    first_index: HashMap<String, usize>,
}

impl InboundForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: FormValue) {
        let name = name.into();
        self.first_index
            .entry(name.clone())
            .or_insert(self.entries.len());
        self.entries.push((name, value));
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.first_index
            .get(name)
            .map(|&index| &self.entries[index].1)
    }

    /// Field name of every entry in arrival order, repeats included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain a multipart stream into memory.
    ///
    /// A part counts as a file whenever its Content-Disposition has a
    /// `filename` parameter. Unnamed parts are dropped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ProxyError> {
        let mut form = InboundForm::new();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            let value = match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    FormValue::File {
                        data,
                        filename,
                        content_type,
                    }
                }
                None => FormValue::Text(field.text().await.map_err(multipart_error)?),
            };

            form.push(name, value);
        }

        Ok(form)
    }
}

fn multipart_error(err: MultipartError) -> ProxyError {
    let status = err.status();
    warn!(status = status.as_u16(), error = %err.body_text(), "multipart_read_failed");

    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ProxyError::RequestTooLarge
    } else {
        ProxyError::InvalidForm(err.body_text())
    }
}
