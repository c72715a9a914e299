use async_trait::async_trait;
use doctor_core::{
    DataSource, DynError, FixtureId, FixtureLoadError, FixtureRecord, fixtures::TickerSeed,
};
use sqlx::{Pool, Postgres, Row as _, postgres::PgPoolOptions, postgres::PgRow};
use tracing::{debug, info};

use crate::config::DatabaseSettings;

const ENSURE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tickers (
    id TEXT PRIMARY KEY DEFAULT md5(random()::text || clock_timestamp()::text),
    symbol TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    chromosome TEXT
)";

/// Ticker collection backed by PostgreSQL. Seeds the configured tickers and
/// reads them back for the decoration check.
pub struct PostgresTickerSource {
    pool: Pool<Postgres>,
    seeds: Vec<TickerSeed>,
}

impl PostgresTickerSource {
    pub async fn connect(
        settings: &DatabaseSettings,
        seeds: Vec<TickerSeed>,
    ) -> Result<Self, sqlx::Error> {
        info!(target = %settings.display_target(), "connecting to ticker database");
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.connection_url())
            .await?;

        let source = Self::with_pool(pool, seeds);
        source.ensure_schema().await?;
        info!("ticker database ready");
        Ok(source)
    }

    #[must_use]
    pub const fn with_pool(pool: Pool<Postgres>, seeds: Vec<TickerSeed>) -> Self {
        Self { pool, seeds }
    }

    #[must_use]
    pub fn seeds(&self) -> &[TickerSeed] {
        &self.seeds
    }

    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(ENSURE_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Stamps every stored ticker with `chromosome`. Handy for exercising the
    /// doctor against a database without the real batch processor.
    pub async fn add_chromosome_to_all(&self, chromosome: &str) -> Result<u64, sqlx::Error> {
        let updated = sqlx::query("UPDATE tickers SET chromosome = $1")
            .bind(chromosome)
            .execute(&self.pool)
            .await?
            .rows_affected();
        debug!(updated, "chromosome added to all tickers");
        Ok(updated)
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tickers")
            .fetch_one(&self.pool)
            .await
    }
}

/// Fails unless the store holds exactly the number of tickers just seeded.
pub fn verify_inserted(expected: usize, actual: i64) -> Result<(), FixtureLoadError> {
    let actual = usize::try_from(actual).unwrap_or_default();
    if actual == expected {
        Ok(())
    } else {
        Err(FixtureLoadError::CountMismatch { expected, actual })
    }
}

fn record_from_row(row: &PgRow) -> Result<FixtureRecord, sqlx::Error> {
    Ok(FixtureRecord {
        id: row.try_get("id")?,
        symbol: row.try_get("symbol")?,
        name: row.try_get("name")?,
        chromosome: row.try_get("chromosome")?,
    })
}

#[async_trait]
impl DataSource for PostgresTickerSource {
    async fn load_fixtures(&self) -> Result<Vec<FixtureId>, DynError> {
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query("DELETE FROM tickers")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        debug!(cleared, "previous tickers removed");

        let mut ids = Vec::with_capacity(self.seeds.len());
        for seed in &self.seeds {
            let row = sqlx::query("INSERT INTO tickers (symbol, name) VALUES ($1, $2) RETURNING id")
                .bind(&seed.symbol)
                .bind(&seed.name)
                .fetch_one(&mut *tx)
                .await?;
            ids.push(row.try_get::<String, _>("id")?);
        }
        tx.commit().await?;

        verify_inserted(self.seeds.len(), self.count().await?)?;

        info!(inserted = ids.len(), "test tickers loaded");
        Ok(ids)
    }

    async fn find_matching(
        &self,
        ids: Option<&[FixtureId]>,
    ) -> Result<Vec<FixtureRecord>, DynError> {
        let rows = match ids {
            Some(ids) => {
                sqlx::query(
                    "SELECT id, symbol, name, chromosome FROM tickers WHERE id = ANY($1) ORDER BY symbol",
                )
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT id, symbol, name, chromosome FROM tickers ORDER BY symbol")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(found = records.len(), "tickers read back");
        Ok(records)
    }
}
