//! PgDatastore — event records backed by Postgres.
//!
//! Publish order is the BIGSERIAL `seq` column, never the timestamps: two
//! events published in the same microsecond still have a defined order.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::Datastore;
use crate::types::EventRecord;

const SELECT_COLUMNS: &str =
    "id, name, payload, published_at, started_at, finished_at, error";

/// Postgres-backed datastore. Cheap to clone (shares the pool).
#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and wrap the pool.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `event_records` table and its candidate index if missing.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS event_records (
                seq           BIGSERIAL    PRIMARY KEY,
                id            UUID         NOT NULL UNIQUE,
                name          TEXT         NOT NULL,
                payload       JSONB        NOT NULL,
                published_at  TIMESTAMPTZ  NOT NULL,
                started_at    TIMESTAMPTZ,
                finished_at   TIMESTAMPTZ,
                error         TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS event_records_unfinished
            ON event_records (seq)
            WHERE finished_at IS NULL
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("event_records schema ready");
        Ok(())
    }

    /// Read a single record by id.
    pub async fn read_event(&self, id: &str) -> StoreResult<Option<EventRecord>> {
        let id = parse_id(id)?;
        let row = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM event_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// The most recently published records, newest first.
    pub async fn read_recent(&self, limit: usize) -> StoreResult<Vec<EventRecord>> {
        let rows = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM event_records ORDER BY seq DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Every record in publish order.
    pub async fn read_all(&self) -> StoreResult<Vec<EventRecord>> {
        let rows = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM event_records ORDER BY seq ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The errored record currently halting the pipeline, if any.
    pub async fn read_blocking(&self) -> StoreResult<Option<EventRecord>> {
        Ok(self.get_event().await?.filter(EventRecord::is_blocking))
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn save_event(&self, event: &mut EventRecord) -> StoreResult<()> {
        let id = if event.is_unsaved() {
            Uuid::new_v4()
        } else {
            parse_id(&event.id)?
        };

        // published_at is written once, on insert.
        sqlx::query(
            r#"
            INSERT INTO event_records (id, name, payload, published_at, started_at, finished_at, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name        = EXCLUDED.name,
                payload     = EXCLUDED.payload,
                started_at  = EXCLUDED.started_at,
                finished_at = EXCLUDED.finished_at,
                error       = EXCLUDED.error
            "#,
        )
        .bind(id)
        .bind(&event.name)
        .bind(&event.payload)
        .bind(event.published_at)
        .bind(event.started_at)
        .bind(event.finished_at)
        .bind(&event.error)
        .execute(&self.pool)
        .await?;

        event.id = id.to_string();
        Ok(())
    }

    async fn get_event(&self) -> StoreResult<Option<EventRecord>> {
        let row = sqlx::query_as::<_, EventRecord>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM event_records
            WHERE finished_at IS NULL
            ORDER BY seq ASC
            LIMIT 1
            "#
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Postgres LIMIT is a signed BIGINT; anything larger means "no limit".
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn parse_id(id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId { id: id.to_string() })
}

// ---------------------------------------------------------------------------
// sqlx::FromRow for EventRecord
// ---------------------------------------------------------------------------

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for EventRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        let id: Uuid = row.try_get("id")?;
        Ok(EventRecord {
            id: id.to_string(),
            name: row.try_get("name")?,
            payload: row.try_get("payload")?,
            published_at: row.try_get("published_at")?,
            started_at: row.try_get("started_at")?,
            finished_at: row.try_get("finished_at")?,
            error: row.try_get("error")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_limit_passes_small_values_through() {
        assert_eq!(sql_limit(0), 0);
        assert_eq!(sql_limit(20), 20);
    }

    #[test]
    fn sql_limit_clamps_instead_of_wrapping() {
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }
}
