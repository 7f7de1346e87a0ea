//! Mail relay client error types.

/// Errors from mail relay calls.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// HTTP transport error after retries were exhausted.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The relay returned a non-2xx status.
    #[error("mail relay {endpoint} returned {status}: {body}")]
    Relay {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The relay accepted the message but its receipt could not be parsed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl MailerError {
    /// Whether the relay refused the message outright (4xx), as opposed to
    /// being unreachable or failing internally.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Relay { status, .. } if (400..500).contains(status))
    }
}
