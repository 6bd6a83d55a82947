//! Submit Proxy - forwards multipart form submissions to a Discord webhook.
//!
//! Browsers post a `payload_json` field plus `files[N]` attachments to
//! `/api/submit`; the proxy checks the attachment total, reorders the files by
//! index and relays the form to the configured webhook.
//!
//! ## Architecture
//!
//! ```text
//! Browser → /api/submit → InboundForm → OutboundSubmission → Discord webhook
//! ```

pub mod config;
pub mod error;
pub mod submission;
pub mod upstream;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{ProxyError, ProxyResponse};
pub use submission::{InboundForm, OutboundSubmission, MAX_TOTAL_ATTACHMENT_BYTES};
pub use web::{router, AppState};
