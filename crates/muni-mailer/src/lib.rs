//! # muni-mailer: Mail Relay Client
//!
//! Delivers issued certificates to their recipients through an HTTP mail
//! relay. One operation, [`MailClient::send`], posts a multipart message
//! (`from`, `to`, `subject`, `text`, optional `attachment`) to
//! `{relay}/v1/messages` and returns the relay's receipt.
//!
//! Delivery is best-effort: transient failures are retried with
//! exponential backoff, and the final failure is returned to the caller to
//! log. Nothing here knows about documents; callers map their own notice
//! type onto [`OutgoingMail`].

pub mod config;
pub mod error;
pub mod retry;

pub use config::{ConfigError, MailerConfig};
pub use error::MailerError;
pub use retry::RetryPolicy;

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// A file attached to an outgoing message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A message to deliver.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

/// The relay's acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveryReceipt {
    /// Relay-assigned message id.
    pub id: String,
}

/// Typed client for the mail relay.
#[derive(Debug, Clone)]
pub struct MailClient {
    http: reqwest::Client,
    endpoint: url::Url,
    from: String,
    retry: RetryPolicy,
}

impl MailClient {
    /// Create a client from configuration.
    pub fn new(config: MailerConfig) -> Result<Self, MailerError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| MailerError::Config(ConfigError::InvalidToken))?,
            );
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| MailerError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            endpoint: config.messages_url()?,
            from: config.from,
            retry: config.retry,
        })
    }

    /// Submit `mail` to the relay.
    pub async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, MailerError> {
        let endpoint = self.endpoint.to_string();

        let resp = retry::retry_send(self.retry, || {
            let form = self.form(mail);
            let request = self.http.post(self.endpoint.clone());
            async move { request.multipart(form?).send().await }
        })
        .await
        .map_err(|source| MailerError::Http {
            endpoint: endpoint.clone(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailerError::Relay {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let receipt: DeliveryReceipt = resp
            .json()
            .await
            .map_err(|source| MailerError::Deserialization {
                endpoint: endpoint.clone(),
                source,
            })?;
        tracing::debug!(message_id = %receipt.id, "mail relay accepted message");
        Ok(receipt)
    }

    /// Multipart forms are single-use, so each attempt builds a fresh one.
    fn form(&self, mail: &OutgoingMail) -> Result<Form, reqwest::Error> {
        let form = Form::new()
            .text("from", self.from.clone())
            .text("to", mail.to.clone())
            .text("subject", mail.subject.clone())
            .text("text", mail.body.clone());
        match &mail.attachment {
            Some(attachment) => {
                let part = Part::bytes(attachment.bytes.clone())
                    .file_name(attachment.filename.clone())
                    .mime_str(&attachment.content_type)?;
                Ok(form.part("attachment", part))
            }
            None => Ok(form),
        }
    }
}
