//! PostgreSQL-backed observation log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxwatch_common::{CurrencyCode, RateObservation};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::store::ObservationStore;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS exchange_rates (
        id              UUID PRIMARY KEY,
        base_currency   VARCHAR(10) NOT NULL,
        target_currency VARCHAR(10) NOT NULL,
        rate            NUMERIC NOT NULL,
        source          VARCHAR(100) NOT NULL,
        observed_at     TIMESTAMPTZ NOT NULL
    )";

const CREATE_INDEX: &str = "
    CREATE INDEX IF NOT EXISTS idx_exchange_rates_pair_time
        ON exchange_rates (base_currency, target_currency, observed_at)";

const INSERT: &str = "
    INSERT INTO exchange_rates (id, base_currency, target_currency, rate, source, observed_at)
    VALUES ($1, $2, $3, $4, $5, $6)";

const SELECT_LATEST: &str = "
    SELECT id, base_currency, target_currency, rate, source, observed_at
    FROM exchange_rates
    WHERE base_currency = $1 AND target_currency = $2
    ORDER BY observed_at DESC, id DESC
    LIMIT 1";

const SELECT_OLDEST_SINCE: &str = "
    SELECT id, base_currency, target_currency, rate, source, observed_at
    FROM exchange_rates
    WHERE base_currency = $1 AND target_currency = $2 AND observed_at >= $3
    ORDER BY observed_at ASC, id ASC
    LIMIT 1";

const SELECT_RANGE_SINCE: &str = "
    SELECT id, base_currency, target_currency, rate, source, observed_at
    FROM exchange_rates
    WHERE base_currency = $1 AND target_currency = $2 AND observed_at >= $3
    ORDER BY observed_at ASC, id ASC";

/// Observation log stored in the `exchange_rates` table.
///
/// Rates are kept at full precision. Ties on `observed_at` resolve by id,
/// which is time-ordered, so they follow insertion order as in memory.
#[derive(Clone)]
pub struct PgObservationStore {
    pool: PgPool,
}

impl PgObservationStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to observation database");
        Ok(Self::new(pool))
    }

    /// Create the table and index if they do not exist.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        info!("Observation schema ready");
        Ok(())
    }

    fn decode(row: &PgRow) -> StoreResult<RateObservation> {
        let base: String = row.try_get("base_currency")?;
        let target: String = row.try_get("target_currency")?;
        Ok(RateObservation {
            id: row.try_get("id")?,
            base: CurrencyCode::new(base),
            target: CurrencyCode::new(target),
            rate: row.try_get("rate")?,
            source: row.try_get("source")?,
            observed_at: row.try_get("observed_at")?,
        })
    }
}

#[async_trait]
impl ObservationStore for PgObservationStore {
    async fn append(&self, observations: &[RateObservation]) -> StoreResult<()> {
        if observations.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for o in observations {
            sqlx::query(INSERT)
                .bind(o.id)
                .bind(o.base.code())
                .bind(o.target.code())
                .bind(o.rate)
                .bind(o.source.as_str())
                .bind(o.observed_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(count = observations.len(), "Appended observations");
        Ok(())
    }

    async fn latest(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> StoreResult<Option<RateObservation>> {
        let row = sqlx::query(SELECT_LATEST)
            .bind(base.code())
            .bind(target.code())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn oldest_since(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<RateObservation>> {
        let row = sqlx::query(SELECT_OLDEST_SINCE)
            .bind(base.code())
            .bind(target.code())
            .bind(since)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn range_since(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<RateObservation>> {
        let rows = sqlx::query(SELECT_RANGE_SINCE)
            .bind(base.code())
            .bind(target.code())
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::decode).collect()
    }

    async fn count(&self) -> StoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exchange_rates")
            .fetch_one(&self.pool)
            .await?;
        usize::try_from(count).map_err(|e| StoreError::Decode(e.to_string()))
    }
}
