//! PostgreSQL implementation of the event log.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::PoolEvent;
use crate::error::LootpotError;

/// Embedded migrations from the crate's `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`LootpotError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), LootpotError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| LootpotError::PersistenceError(e.to_string()))
    }

    /// Appends a raw event row to the log.
    ///
    /// # Errors
    ///
    /// Returns a [`LootpotError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        pool_id: Option<Uuid>,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, LootpotError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (pool_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(pool_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LootpotError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Serializes and appends a domain event.
    ///
    /// # Errors
    ///
    /// Returns a [`LootpotError::PersistenceError`] on serialization or
    /// database failure.
    pub async fn record(&self, event: &PoolEvent) -> Result<i64, LootpotError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| LootpotError::PersistenceError(e.to_string()))?;
        self.save_event(
            event.pool_id().map(|id| *id.as_uuid()),
            event.event_type_str(),
            &payload,
        )
        .await
    }
}
