//! Application persistence operations.
//!
//! Status transitions are enforced by `muni_state::Application`; SQL only
//! records the outcome.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use muni_core::{ApplicationId, CitizenId, DocumentCategory, DocumentId, Timestamp};
use muni_state::{Application, ApplicationStatus};

use super::decode_error;

/// Insert a newly submitted application.
pub async fn insert(pool: &PgPool, application: &Application) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO applications
             (id, requester_id, title, category, status, submitted_at, processed_at, document_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(application.id.get())
    .bind(application.requester.get())
    .bind(&application.title)
    .bind(application.category.as_str())
    .bind(application.status.as_str())
    .bind(*application.submitted_at.as_datetime())
    .bind(application.processed_at.map(|t| *t.as_datetime()))
    .bind(application.document_id.map(DocumentId::get))
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a review decision. Returns `false` if no row matched.
pub async fn update_decision(pool: &PgPool, application: &Application) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE applications SET status = $1, processed_at = $2 WHERE id = $3",
    )
    .bind(application.status.as_str())
    .bind(application.processed_at.map(|t| *t.as_datetime()))
    .bind(application.id.get())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load every application, ordered by id.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Application>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ApplicationRow>(
        "SELECT id, requester_id, title, category, status, submitted_at, processed_at, document_id
         FROM applications ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ApplicationRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    requester_id: i64,
    title: String,
    category: String,
    status: String,
    submitted_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    document_id: Option<i64>,
}

impl ApplicationRow {
    fn into_record(self) -> Result<Application, sqlx::Error> {
        let row_id = self.id;
        let bad = |e: String| decode_error("applications", row_id, e);

        let id = ApplicationId::new(self.id).ok_or_else(|| bad("non-positive id".into()))?;
        let requester = CitizenId::new(self.requester_id)
            .ok_or_else(|| bad(format!("invalid requester_id {}", self.requester_id)))?;
        let category = DocumentCategory::parse(&self.category).map_err(|e| bad(e.to_string()))?;
        let status = ApplicationStatus::parse(&self.status).map_err(|e| bad(e.to_string()))?;
        let document_id = match self.document_id {
            Some(raw) => {
                Some(DocumentId::new(raw).ok_or_else(|| bad(format!("invalid document_id {raw}")))?)
            }
            None => None,
        };

        Ok(Application {
            id,
            requester,
            title: self.title,
            category,
            status,
            submitted_at: Timestamp::from(self.submitted_at),
            processed_at: self.processed_at.map(Timestamp::from),
            document_id,
        })
    }
}
