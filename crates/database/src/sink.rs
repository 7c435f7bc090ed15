//! Prediction sink implementations.

use std::sync::Arc;

use async_trait::async_trait;
use config::DbConfig;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
use tracing::{debug, error, warn};

use crate::PredictionRecord;

/// Idempotent schema creation; safe under concurrent callers because the
/// store itself guards the IF NOT EXISTS check.
const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS predictions ( \
     date DATE PRIMARY KEY, \
     predicted_price FLOAT \
 )";

/// Insert-or-overwrite keyed by date.
const UPSERT_SQL: &str = "INSERT INTO predictions (date, predicted_price) \
     VALUES (?, ?) \
     ON DUPLICATE KEY UPDATE predicted_price = ?";

/// Outcome of a persistence attempt. The caller may log it but must not
/// let it influence the response already prepared from the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// All rows were written and committed.
    Saved(usize),
    /// Something failed; details were already logged.
    Failed,
}

impl PersistOutcome {
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Best-effort writer of prediction records.
#[async_trait]
pub trait PredictionSink: Send + Sync {
    /// Upserts the given rows into the store.
    ///
    /// Never returns an error: every failure is logged and mapped to
    /// [`PersistOutcome::Failed`].
    async fn persist(&self, rows: &[PredictionRecord]) -> PersistOutcome;
}

/// Selects the sink implementation once, at startup.
///
/// Returns the [`NullSink`] when the database is disabled, so call sites
/// never branch on availability themselves.
#[must_use]
pub fn sink_from_config(config: &DbConfig) -> Arc<dyn PredictionSink> {
    if config.disabled {
        warn!("Database disabled; predictions will not be persisted");
        Arc::new(NullSink)
    } else {
        Arc::new(MySqlSink::new(config.clone()))
    }
}

/// Sink backed by a MySQL database.
///
/// Each call opens its own connection, ensures the schema, writes all
/// rows in one transaction, and closes the connection. Connections are
/// never pooled or held across requests.
pub struct MySqlSink {
    config: DbConfig,
}

impl MySqlSink {
    #[must_use]
    pub const fn new(config: DbConfig) -> Self {
        Self { config }
    }

    async fn write_rows(&self, rows: &[PredictionRecord]) -> Result<usize, sqlx::Error> {
        let options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database);

        let mut conn = MySqlConnection::connect_with(&options).await?;

        conn.execute(CREATE_TABLE_SQL).await?;

        let mut tx = conn.begin().await?;
        for row in rows {
            sqlx::query(UPSERT_SQL)
                .bind(row.date)
                .bind(row.predicted_price)
                .bind(row.predicted_price)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        conn.close().await?;

        Ok(rows.len())
    }
}

#[async_trait]
impl PredictionSink for MySqlSink {
    async fn persist(&self, rows: &[PredictionRecord]) -> PersistOutcome {
        match self.write_rows(rows).await {
            Ok(written) => {
                debug!(written, "Persisted prediction rows");
                PersistOutcome::Saved(written)
            }
            Err(e) => {
                error!(error = %e, "Database write failed");
                PersistOutcome::Failed
            }
        }
    }
}

/// Sink used when the database is unavailable or disabled. Reports every
/// attempt as a failure without touching any external system.
pub struct NullSink;

#[async_trait]
impl PredictionSink for NullSink {
    async fn persist(&self, rows: &[PredictionRecord]) -> PersistOutcome {
        warn!(rows = rows.len(), "Persistence disabled; dropping rows");
        PersistOutcome::Failed
    }
}
