use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tokio::sync::Mutex;

use crate::{
    InsertOutcome, NewUrl, OwnerId, Result, ShortCode, StoreError, UrlRecord,
    store::{UrlStore, UrlTransaction, validate_batch},
};

const RECORD_COLUMNS: &str =
    "original_url, short_code, correlation_id, owner_id, is_deleted, created_at";

/// PostgreSQL-backed URL store implementation.
#[derive(Clone)]
pub struct PostgresUrlStore {
    pool: PgPool,
}

impl PostgresUrlStore {
    /// Creates a new PostgreSQL URL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `dsn` and returns a store over a fresh pool.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(dsn)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<UrlRecord> {
        Ok(UrlRecord {
            original_url: row.try_get("original_url")?,
            code: ShortCode::new(row.try_get::<String, _>("short_code")?),
            correlation_id: row.try_get("correlation_id")?,
            owner: OwnerId::new(row.try_get::<String, _>("owner_id")?),
            deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_insert_error(e: sqlx::Error, url: &NewUrl) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return StoreError::Conflict {
                original_url: url.original_url.clone(),
                code: url.code.clone(),
            };
        }
        StoreError::Database(e)
    }

    async fn get_by_original_url(&self, original_url: &str) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM urls WHERE original_url = $1"
        ))
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }
}

#[async_trait]
impl UrlStore for PostgresUrlStore {
    type Tx = PostgresTransaction;

    async fn insert(&self, url: NewUrl) -> Result<InsertOutcome> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO urls (original_url, short_code, correlation_id, owner_id, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (original_url) DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(&url.original_url)
        .bind(url.code.as_str())
        .bind(&url.correlation_id)
        .bind(url.owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(e, &url))?;

        if let Some(row) = row {
            return Ok(InsertOutcome::Created(Self::row_to_record(row)?));
        }

        // Lost the race on original_url; report the winner.
        let existing = self
            .get_by_original_url(&url.original_url)
            .await?
            .ok_or_else(|| StoreError::Conflict {
                original_url: url.original_url.clone(),
                code: url.code.clone(),
            })?;
        Ok(InsertOutcome::Exists(existing))
    }

    async fn insert_batch(&self, urls: Vec<NewUrl>) -> Result<Vec<UrlRecord>> {
        validate_batch(&urls)?;

        let mut tx = self.pool.begin().await?;
        let mut records = Vec::with_capacity(urls.len());

        for url in &urls {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO urls (original_url, short_code, correlation_id, owner_id, created_at)
                VALUES ($1, $2, $3, $4, NOW())
                RETURNING {RECORD_COLUMNS}
                "#
            ))
            .bind(&url.original_url)
            .bind(url.code.as_str())
            .bind(&url.correlation_id)
            .bind(url.owner.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::map_insert_error(e, url))?;

            records.push(Self::row_to_record(row)?);
        }

        tx.commit().await?;
        Ok(records)
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM urls WHERE short_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM urls
            WHERE owner_id = $1 AND NOT is_deleted
            ORDER BY created_at ASC, short_code ASC
            "#
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> Result<PostgresTransaction> {
        let tx = self.pool.begin().await?;
        tracing::debug!("deletion transaction opened");
        Ok(PostgresTransaction { tx: Mutex::new(tx) })
    }
}

/// Deletion transaction over a [`PostgresUrlStore`].
///
/// A connection runs one statement at a time, so concurrent callers of
/// `mark_deleted` take turns on the inner transaction.
///
/// Each mark runs inside its own savepoint. A failed `UPDATE` is undone back
/// to that savepoint, leaving the transaction usable, so later marks report
/// their own result instead of "current transaction is aborted".
pub struct PostgresTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl UrlTransaction for PostgresTransaction {
    async fn mark_deleted(&self, owner: &OwnerId, code: &ShortCode) -> Result<u64> {
        let mut tx = self.tx.lock().await;

        sqlx::query("SAVEPOINT mark_deleted")
            .execute(&mut **tx)
            .await?;

        let update =
            sqlx::query("UPDATE urls SET is_deleted = TRUE WHERE short_code = $1 AND owner_id = $2")
                .bind(code.as_str())
                .bind(owner.as_str())
                .execute(&mut **tx)
                .await;

        match update {
            Ok(result) => {
                sqlx::query("RELEASE SAVEPOINT mark_deleted")
                    .execute(&mut **tx)
                    .await?;
                Ok(result.rows_affected())
            }
            Err(e) => {
                tracing::debug!(%owner, %code, error = %e, "mark failed, rolling back to savepoint");
                sqlx::query("ROLLBACK TO SAVEPOINT mark_deleted")
                    .execute(&mut **tx)
                    .await?;
                Err(e.into())
            }
        }
    }

    async fn commit(self) -> Result<()> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.into_inner().rollback().await?;
        Ok(())
    }
}
