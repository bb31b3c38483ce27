use crate::error::DbError;
use configuration::{SessionConfig, StoreConfig};
use dotenvy::dotenv;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Establishes a connection pool from the `DATABASE_URL` environment variable.
///
/// The `.env` file is optional here; an exported variable works just as well.
/// This is the zero-argument path used for the data portal.
pub async fn connect() -> Result<PgPool, DbError> {
    // Load environment variables from the .env file, if there is one.
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_e| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;

    Ok(pool)
}

/// Establishes a connection pool for one configured store.
pub async fn connect_with(config: &StoreConfig) -> Result<PgPool, DbError> {
    tracing::debug!(max_connections = config.max_connections, "Connecting to store.");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// Establishes the session pool, tagging connections with `application_name`.
pub async fn connect_session(config: &SessionConfig) -> Result<PgPool, DbError> {
    let mut options = PgConnectOptions::from_str(&config.url)?;
    if let Some(name) = &config.application_name {
        options = options.application_name(name);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// A utility function to run database migrations automatically.
///
/// Creates the `algo_metadata`, `backtest_results` and `klines` tables if they
/// are missing.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_store_url_is_rejected_before_connecting() {
        let config = StoreConfig {
            url: "definitely not a url".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        };
        let err = connect_with(&config).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionError(_)));
    }

    #[tokio::test]
    async fn malformed_session_url_is_rejected_before_connecting() {
        let config = SessionConfig {
            url: "::".to_string(),
            application_name: Some("tests".to_string()),
            max_connections: 1,
            acquire_timeout_secs: 1,
        };
        let err = connect_session(&config).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionError(_)));
    }
}
