//! Mail relay client configuration.
//!
//! The relay is optional. When `MAIL_RELAY_URL` is unset, [`MailerConfig::from_env`]
//! returns `Ok(None)` and callers log deliveries instead of sending them.

use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;

/// Configuration for connecting to the mail relay.
///
/// Custom `Debug` implementation redacts the `api_token` field.
#[derive(Clone)]
pub struct MailerConfig {
    /// Base URL of the relay. Messages are posted to `{relay_url}/v1/messages`.
    pub relay_url: Url,
    /// Bearer token for the relay, if it requires one.
    pub api_token: Option<String>,
    /// Sender address.
    pub from: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("relay_url", &self.relay_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl MailerConfig {
    /// Default sender address.
    pub const DEFAULT_FROM: &'static str = "no-reply@smart-municipal.local";

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `MAIL_RELAY_URL` (absent: returns `Ok(None)`)
    /// - `MAIL_RELAY_TOKEN` (optional)
    /// - `MAIL_FROM` (default: `no-reply@smart-municipal.local`)
    /// - `MAIL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Ok(raw) = std::env::var("MAIL_RELAY_URL") else {
            return Ok(None);
        };
        let relay_url = parse_url("MAIL_RELAY_URL", &raw)?;
        Ok(Some(Self {
            relay_url,
            api_token: std::env::var("MAIL_RELAY_TOKEN").ok().filter(|t| !t.is_empty()),
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| Self::DEFAULT_FROM.to_string()),
            timeout_secs: std::env::var("MAIL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            retry: RetryPolicy::default(),
        }))
    }

    /// Configuration pointing at a local mock relay (for testing). Retries
    /// are fast so tests stay quick.
    pub fn local_mock(uri: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            relay_url: parse_url("mock relay", uri)?,
            api_token: Some("test-token".to_string()),
            from: Self::DEFAULT_FROM.to_string(),
            timeout_secs: 5,
            retry: RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(5),
            },
        })
    }

    /// Full URL of the message submission endpoint.
    pub fn messages_url(&self) -> Result<Url, ConfigError> {
        let base = self.relay_url.as_str().trim_end_matches('/');
        parse_url("messages endpoint", &format!("{base}/v1/messages"))
    }
}

fn parse_url(what: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(what.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(
            what.to_string(),
            format!("unsupported scheme {other:?}"),
        )),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid relay token: not a valid header value")]
    InvalidToken,
}
