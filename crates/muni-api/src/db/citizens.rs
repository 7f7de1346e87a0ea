//! Citizen persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use muni_core::{CitizenId, EmailAddress};
use muni_state::Citizen;

use super::decode_error;

/// Insert a newly registered citizen.
pub async fn insert(pool: &PgPool, citizen: &Citizen) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO citizens (id, full_name, email, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(citizen.id.get())
    .bind(&citizen.full_name)
    .bind(citizen.email.as_str())
    .bind(*citizen.created_at.as_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load every citizen, ordered by id.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Citizen>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CitizenRow>(
        "SELECT id, full_name, email, created_at FROM citizens ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CitizenRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct CitizenRow {
    id: i64,
    full_name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl CitizenRow {
    fn into_record(self) -> Result<Citizen, sqlx::Error> {
        let id = CitizenId::new(self.id)
            .ok_or_else(|| decode_error("citizens", self.id, "non-positive id"))?;
        let email =
            EmailAddress::parse(&self.email).map_err(|e| decode_error("citizens", self.id, e))?;
        Ok(Citizen {
            id,
            full_name: self.full_name,
            email,
            created_at: self.created_at.into(),
        })
    }
}
