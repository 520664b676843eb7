//! MySQL experience store.
//!
//! Operates on the `UserExperience` table (see `sql/schema.sql`). The pool is
//! owned by this adapter and injected into handlers through `AppState`; every
//! statement autocommits except the increment, which runs in a short
//! transaction so the updated row can be read back consistently.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use super::{ExperienceRecord, ExperienceStore, StoreError, EXPERIENCE_STEP};
use crate::config::DatabaseConfig;
use crate::observability::metrics;
use crate::resilience::retries::{Idempotency, RetryPolicy};

#[derive(Debug, sqlx::FromRow)]
struct ExperienceRow {
    #[sqlx(rename = "userId")]
    user_id: String,
    experience: Option<i32>,
}

impl From<ExperienceRow> for ExperienceRecord {
    fn from(row: ExperienceRow) -> Self {
        Self {
            user_id: row.user_id,
            experience: row.experience.unwrap_or(0),
        }
    }
}

const SELECT_RECORD: &str = "SELECT userId, experience FROM UserExperience WHERE userId = ?";

/// Pooled MySQL adapter.
#[derive(Debug, Clone)]
pub struct MySqlExperienceStore {
    pool: MySqlPool,
    retry: RetryPolicy,
}

impl MySqlExperienceStore {
    /// Open the pool, retrying transient connection failures with backoff.
    pub async fn connect(config: &DatabaseConfig, retry: RetryPolicy) -> Result<Self, StoreError> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(config.password.as_deref().unwrap_or_default())
            .database(&config.name);

        let pool_options = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .test_before_acquire(true);

        let pool = retry
            .run("connect", Idempotency::Idempotent, is_transient, || {
                pool_options.clone().connect_with(options.clone())
            })
            .await
            .map_err(map_error)?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "Connected to experience store"
        );
        Ok(Self { pool, retry })
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ExperienceStore for MySqlExperienceStore {
    async fn get(&self, user_id: &str) -> Result<ExperienceRecord, StoreError> {
        let pool = &self.pool;
        let result = self
            .retry
            .run("get", Idempotency::Idempotent, is_transient, move || {
                sqlx::query_as::<_, ExperienceRow>(SELECT_RECORD)
                    .bind(user_id)
                    .fetch_optional(pool)
            })
            .await
            .map_err(map_error)
            .and_then(|row| row.map(ExperienceRecord::from).ok_or(StoreError::NotFound));
        observed("get", result)
    }

    async fn create(&self, user_id: &str) -> Result<ExperienceRecord, StoreError> {
        let result = sqlx::query("INSERT INTO UserExperience (userId, experience) VALUES (?, 0)")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|_| ExperienceRecord::new(user_id))
            .map_err(map_error);
        observed("create", result)
    }

    async fn increment_by_ten(&self, user_id: &str) -> Result<ExperienceRecord, StoreError> {
        observed("increment", self.increment_once(user_id).await)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        let pool = &self.pool;
        let result = self
            .retry
            .run("delete", Idempotency::Idempotent, is_transient, move || {
                sqlx::query("DELETE FROM UserExperience WHERE userId = ?")
                    .bind(user_id)
                    .execute(pool)
            })
            .await
            .map(|_| ())
            .map_err(map_error);
        observed("delete", result)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let pool = &self.pool;
        self.retry
            .run("ping", Idempotency::Idempotent, is_transient, move || {
                sqlx::query("SELECT 1").execute(pool)
            })
            .await
            .map(|_| ())
            .map_err(map_error)
    }
}

impl MySqlExperienceStore {
    async fn increment_once(&self, user_id: &str) -> Result<ExperienceRecord, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_error)?;

        let updated = sqlx::query(
            "UPDATE UserExperience SET experience = COALESCE(experience, 0) + ? WHERE userId = ?",
        )
        .bind(EXPERIENCE_STEP)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(map_error)?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::NotFound);
        }

        let row = sqlx::query_as::<_, ExperienceRow>(SELECT_RECORD)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_error)?;

        tx.commit().await.map_err(map_error)?;
        Ok(row.into())
    }
}

/// Connection-level failures worth another attempt.
fn is_transient(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_)
    )
}

fn map_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::unavailable(error.to_string()),
    }
}

fn observed<T>(operation: &'static str, result: Result<T, StoreError>) -> Result<T, StoreError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(StoreError::NotFound) => "not_found",
        Err(StoreError::Conflict) => "conflict",
        Err(StoreError::Unavailable(message)) => {
            tracing::error!(operation, error = %message, "Experience store failure");
            "unavailable"
        }
    };
    metrics::record_store(operation, outcome);
    result
}
