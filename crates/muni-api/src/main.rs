//! # muni-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).

use metrics_exporter_prometheus::PrometheusBuilder;
use muni_api::state::{AppConfig, AppState};
use muni_mailer::{MailClient, MailerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");

    let metrics = if config.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder().map_err(|e| {
            tracing::error!("Failed to install metrics recorder: {e}");
            e
        })?)
    } else {
        None
    };

    // Initialize database pool (optional; absent means in-memory only).
    let db_pool = muni_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let mailer = match MailerConfig::from_env()? {
        Some(mail_config) => {
            tracing::info!(relay = %mail_config.relay_url, "mail relay configured");
            Some(MailClient::new(mail_config)?)
        }
        None => {
            tracing::warn!("MAIL_RELAY_URL not set; certificates will not be emailed");
            None
        }
    };

    let port = config.port;
    let state = AppState::new(config)
        .with_db_pool(db_pool)
        .with_mailer(mailer)
        .with_metrics(metrics)
        .hydrate_from_db()
        .await
        .map_err(|e| {
            tracing::error!("Database hydration failed: {e}");
            e
        })?;

    let app = muni_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("muni-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
