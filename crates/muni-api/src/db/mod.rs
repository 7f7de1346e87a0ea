//! # Database Persistence Layer
//!
//! Postgres persistence for citizens, applications and documents via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, every
//! write accepted by the in-memory ledger is written through, and the ledger
//! is rebuilt from these tables at startup. When absent the API runs
//! in-memory only (development and testing).
//!
//! Row structs decode into domain records through the same validating
//! constructors the API uses, so a corrupt row fails hydration instead of
//! producing an invalid record.

pub mod applications;
pub mod citizens;
pub mod documents;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. \
                 Issued documents will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Wrap a row-decoding failure as a `sqlx::Error`.
pub(crate) fn decode_error(
    table: &'static str,
    id: i64,
    err: impl std::fmt::Display,
) -> sqlx::Error {
    tracing::error!(table, id, error = %err, "stored row failed validation");
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("{table} row {id}: {err}"),
    )))
}
