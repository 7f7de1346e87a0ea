//! Document persistence operations.
//!
//! Documents are immutable once written. Issuance writes the document and
//! the application's new status in one transaction so the two tables never
//! disagree after a crash.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use muni_core::{ApplicationId, CitizenId, DocumentCategory, DocumentId, Timestamp};
use muni_docs::Document;
use muni_state::Application;

use super::decode_error;

/// Persist an issuance: the linked application and its new document.
pub async fn insert_issuance(
    pool: &PgPool,
    application: &Application,
    document: &Document,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO documents
             (id, application_id, title, issued_to, category, document_hash, issued_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(document.id.get())
    .bind(document.application_id.get())
    .bind(&document.title)
    .bind(document.issued_to.get())
    .bind(document.category.as_str())
    .bind(&document.document_hash)
    .bind(*document.issued_at.as_datetime())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE applications SET status = $1, processed_at = $2, document_id = $3 WHERE id = $4",
    )
    .bind(application.status.as_str())
    .bind(application.processed_at.map(|t| *t.as_datetime()))
    .bind(document.id.get())
    .bind(application.id.get())
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Load every document, ordered by id.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Document>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DocumentRow>(
        "SELECT id, application_id, title, issued_to, category, document_hash, issued_at
         FROM documents ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DocumentRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    application_id: i64,
    title: String,
    issued_to: i64,
    category: String,
    document_hash: String,
    issued_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_record(self) -> Result<Document, sqlx::Error> {
        let row_id = self.id;
        let bad = |e: String| decode_error("documents", row_id, e);

        Ok(Document {
            id: DocumentId::new(self.id).ok_or_else(|| bad("non-positive id".into()))?,
            application_id: ApplicationId::new(self.application_id)
                .ok_or_else(|| bad(format!("invalid application_id {}", self.application_id)))?,
            title: self.title,
            issued_to: CitizenId::new(self.issued_to)
                .ok_or_else(|| bad(format!("invalid issued_to {}", self.issued_to)))?,
            category: DocumentCategory::parse(&self.category).map_err(|e| bad(e.to_string()))?,
            document_hash: self.document_hash,
            issued_at: Timestamp::from(self.issued_at),
        })
    }
}
