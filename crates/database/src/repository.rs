use crate::DbError;
use chrono::{DateTime, Utc};
use core_types::{AlgoMetadata, BacktestResult, HarnessId, Kline, RemoteId};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPool;
use sqlx::Row;

/// Reads and writes algorithm metadata documents, keyed by harness id.
#[derive(Debug, Clone)]
pub struct MetadataRepository {
    pool: PgPool,
}

/// Reads and writes backtest results, keyed by remote id.
#[derive(Debug, Clone)]
pub struct BacktestResultsRepository {
    pool: PgPool,
}

/// Historical market data. Backs the data portal.
#[derive(Debug, Clone)]
pub struct KlineRepository {
    pool: PgPool,
}

/// A live session against the session store, handed to business logic as-is.
#[derive(Debug, Clone)]
pub struct DbSession {
    pool: PgPool,
}

impl MetadataRepository {
    /// Creates a new `MetadataRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the metadata document stored for a harness.
    pub async fn get_metadata(&self, harness_id: &HarnessId) -> Result<AlgoMetadata, DbError> {
        let document: Option<JsonValue> =
            sqlx::query_scalar("SELECT metadata FROM algo_metadata WHERE harness_id = $1")
                .bind(harness_id)
                .fetch_optional(&self.pool)
                .await?;

        let document = document.ok_or_else(|| DbError::NotFound {
            entity: "algo metadata",
            key: harness_id.to_string(),
        })?;

        AlgoMetadata::try_from(document).map_err(|e| DbError::InvalidDocument {
            entity: "algo metadata",
            key: harness_id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Inserts or replaces the metadata for a harness.
    pub async fn save_metadata(
        &self,
        harness_id: &HarnessId,
        metadata: &AlgoMetadata,
    ) -> Result<(), DbError> {
        let document = serde_json::to_value(metadata)?;
        sqlx::query(
            r#"
            INSERT INTO algo_metadata (harness_id, metadata, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (harness_id) DO UPDATE SET metadata = EXCLUDED.metadata, updated_at = NOW()
            "#,
        )
        .bind(harness_id)
        .bind(document)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl BacktestResultsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the backtest result stored under a remote id.
    pub async fn get(&self, remote_id: &RemoteId) -> Result<BacktestResult, DbError> {
        let result: Option<JsonValue> =
            sqlx::query_scalar("SELECT result FROM backtest_results WHERE remote_id = $1")
                .bind(remote_id)
                .fetch_optional(&self.pool)
                .await?;

        result.map(BacktestResult::new).ok_or_else(|| DbError::NotFound {
            entity: "backtest result",
            key: remote_id.to_string(),
        })
    }

    /// Inserts or replaces a backtest result.
    pub async fn save_result(
        &self,
        remote_id: &RemoteId,
        result: &BacktestResult,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO backtest_results (remote_id, result, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (remote_id) DO UPDATE SET result = EXCLUDED.result, updated_at = NOW()
            "#,
        )
        .bind(remote_id)
        .bind(result.as_value())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl KlineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches all klines for a given symbol and interval within a date range.
    pub async fn get_klines_by_date_range(
        &self,
        symbol: &str,
        interval: &str,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Vec<Kline>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT open_time, open, high, low, close, volume, close_time
            FROM klines
            WHERE symbol = $1 AND interval = $2 AND open_time >= $3 AND open_time <= $4
            ORDER BY open_time ASC
            "#,
        )
        .bind(symbol)
        .bind(interval)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        let klines = rows
            .into_iter()
            .map(|row| -> Result<Kline, sqlx::Error> {
                Ok(Kline {
                    open_time: row.try_get("open_time")?,
                    open: row.try_get("open")?,
                    high: row.try_get("high")?,
                    low: row.try_get("low")?,
                    close: row.try_get("close")?,
                    volume: row.try_get("volume")?,
                    close_time: row.try_get("close_time")?,
                    interval: interval.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(klines)
    }
}

impl DbSession {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Round-trips a trivial query to prove the session is usable.
    pub async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
