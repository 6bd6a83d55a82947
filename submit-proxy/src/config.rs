//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup and shared read-only with the handlers.
//! A changed `DISCORD_WEBHOOK_URL` takes effect only after a restart.

use std::env;
use tracing::warn;
use url::Url;

use crate::submission::MAX_TOTAL_ATTACHMENT_BYTES;

/// Default inbound body limit for the submit route (32 MiB).
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 32 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord webhook URL submissions are forwarded to.
    ///
    /// `None` when unset or empty; every submission then fails with a
    /// configuration error.
    pub discord_webhook_url: Option<String>,

    /// Port for the web server to listen on
    pub port: u16,

    /// Maximum size of an inbound request body in bytes
    pub max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            discord_webhook_url: None,
            port: 8080,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            discord_webhook_url: env::var("DISCORD_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.is_empty()),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            max_request_bytes: parse_request_limit("MAX_REQUEST_BYTES"),
        }
    }

    /// Host portion of the webhook URL, safe to log.
    ///
    /// Discord webhook URLs embed their token in the path, so only the host
    /// ever leaves this struct.
    pub fn webhook_host(&self) -> Option<String> {
        let raw = self.discord_webhook_url.as_deref()?;
        match Url::parse(raw) {
            Ok(url) => url.host_str().map(str::to_string),
            Err(e) => {
                warn!(error = %e, "webhook_url_unparseable");
                None
            }
        }
    }
}

/// Parse the request body limit, never letting it drop below the attachment
/// ceiling.
fn parse_request_limit(name: &str) -> usize {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return DEFAULT_MAX_REQUEST_BYTES,
    };

    match raw.trim().parse::<usize>() {
        Ok(limit) if limit >= MAX_TOTAL_ATTACHMENT_BYTES => limit,
        Ok(limit) => {
            warn!(
                env_var = name,
                value = limit,
                minimum = MAX_TOTAL_ATTACHMENT_BYTES,
                "request_limit_below_attachment_ceiling"
            );
            MAX_TOTAL_ATTACHMENT_BYTES
        }
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid request limit, using default");
            DEFAULT_MAX_REQUEST_BYTES
        }
    }
}
