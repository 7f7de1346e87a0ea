//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! The [`MemoryLedger`] is authoritative at runtime. When a database pool is
//! present every write is also persisted, and the ledger is rebuilt from
//! the database at startup by [`AppState::hydrate_from_db`].

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use thiserror::Error;

use muni_core::{ValidationError, VerificationPrefix};
use muni_docs::{CertificateRenderer, MemoryLedger, RenderError};
use muni_mailer::MailClient;

/// Errors reading [`AppConfig`] from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid VERIFICATION_URL_PREFIX: {0}")]
    InvalidPrefix(#[from] ValidationError),

    /// The longest verification URL under the prefix would not fit the
    /// certificate QR code.
    #[error("VERIFICATION_URL_PREFIX too long for certificates: {0}")]
    PrefixTooLong(#[source] RenderError),
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Bearer secret. `None` disables authentication.
    pub auth_token: Option<String>,
    /// Base of every verification URL embedded in certificates.
    pub verification_prefix: VerificationPrefix,
    /// Whether `/metrics` is served.
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("verification_prefix", &self.verification_prefix.as_str())
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            verification_prefix: VerificationPrefix::localhost(8080),
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Read `PORT`, `AUTH_TOKEN`, `VERIFICATION_URL_PREFIX` and
    /// `MUNI_METRICS_ENABLED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let auth_token = lookup("AUTH_TOKEN").filter(|t| !t.trim().is_empty());

        let verification_prefix = match lookup("VERIFICATION_URL_PREFIX") {
            Some(raw) => VerificationPrefix::parse(&raw)?,
            None => {
                let fallback = VerificationPrefix::localhost(port);
                tracing::warn!(
                    prefix = %fallback,
                    "VERIFICATION_URL_PREFIX not set; certificates will point at localhost"
                );
                fallback
            }
        };

        let qr_version = CertificateRenderer::new(verification_prefix.clone())
            .ensure_capacity()
            .map_err(ConfigError::PrefixTooLong)?;
        tracing::debug!(prefix = %verification_prefix, qr_version, "verification prefix fits certificates");

        let metrics_enabled = lookup("MUNI_METRICS_ENABLED")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Ok(Self {
            port,
            auth_token,
            verification_prefix,
            metrics_enabled,
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<MemoryLedger>,
    pub renderer: Arc<CertificateRenderer>,
    /// Postgres pool for write-through persistence. `None` means in-memory only.
    pub db_pool: Option<PgPool>,
    /// Mail relay client. `None` means deliveries are logged and skipped.
    pub mailer: Option<MailClient>,
    pub metrics: Option<PrometheusHandle>,
    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with no database, mail relay or metrics exporter.
    pub fn new(config: AppConfig) -> Self {
        Self::with_ledger(config, MemoryLedger::new())
    }

    pub fn with_ledger(config: AppConfig, ledger: MemoryLedger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            renderer: Arc::new(CertificateRenderer::new(config.verification_prefix.clone())),
            db_pool: None,
            mailer: None,
            metrics: None,
            config,
        }
    }

    pub fn with_db_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }

    pub fn with_mailer(mut self, mailer: Option<MailClient>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Replace the ledger with the rows stored in the database, if connected.
    pub async fn hydrate_from_db(mut self) -> Result<Self, sqlx::Error> {
        let Some(pool) = self.db_pool.clone() else {
            return Ok(self);
        };

        let citizens = crate::db::citizens::load_all(&pool).await?;
        let applications = crate::db::applications::load_all(&pool).await?;
        let documents = crate::db::documents::load_all(&pool).await?;
        tracing::info!(
            citizens = citizens.len(),
            applications = applications.len(),
            documents = documents.len(),
            "ledger hydrated from database"
        );

        self.ledger = Arc::new(MemoryLedger::restore(citizens, applications, documents));
        Ok(self)
    }
}
