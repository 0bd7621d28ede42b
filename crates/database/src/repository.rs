//! Persistence for the three durable shapes spec §6.4 names: compliance
//! state per `(broker, account_id, account_type)`, one auto-optimizer state
//! per bot, and the bot map itself (`BotConfig` + last-known `BotStatus`,
//! so a restart can recreate every configured bot without redeploying).
//!
//! Every snapshot column is `jsonb` carrying a tagged-union payload
//! (`{"version": "1", ...}`); `version` is duplicated into its own column
//! so a caller can filter/migrate rows without deserializing the payload.
//! Readers dispatch on that tag before deserializing (spec §6.4: "readers
//! must accept older versions").

use chrono::{DateTime, Utc};
use compliance::ComplianceSnapshot;
use core_types::{AccountType, BotConfig, BotId, BotStatus, ComplianceScope};
use optimizer::OptimizerState;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPool;
use sqlx::FromRow;

use crate::DbError;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct SnapshotRow {
    snapshot: JsonValue,
}

#[derive(FromRow)]
struct StateRow {
    state: JsonValue,
}

#[derive(FromRow)]
struct BotRow {
    bot_id: String,
    config: JsonValue,
    status: JsonValue,
}

fn tagged_version(payload: &JsonValue) -> &str {
    payload.get("version").and_then(JsonValue::as_str).unwrap_or("unknown")
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts a compliance snapshot, keyed by `(broker_name, account_id,
    /// account_type)`.
    pub async fn save_compliance_snapshot(&self, snapshot: &ComplianceSnapshot) -> Result<(), DbError> {
        let scope = snapshot.scope();
        let payload = serde_json::to_value(snapshot)?;
        let version = tagged_version(&payload);

        sqlx::query(
            r#"
            INSERT INTO compliance_snapshots (account_id, account_type, broker_name, version, snapshot, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (broker_name, account_id, account_type)
            DO UPDATE SET version = EXCLUDED.version, snapshot = EXCLUDED.snapshot, updated_at = NOW()
            "#,
        )
        .bind(&scope.account_id)
        .bind(account_type_str(scope.account_type))
        .bind(&scope.broker_name)
        .bind(version)
        .bind(&payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads the most recently saved compliance snapshot for a scope, or
    /// `Ok(None)` if this is the first time this account has been seen.
    /// Accepts any tagged version the current `ComplianceSnapshot` enum
    /// knows how to deserialize — older variants are added to that enum,
    /// never handled here.
    pub async fn load_compliance_snapshot(
        &self,
        scope: &ComplianceScope,
    ) -> Result<Option<ComplianceSnapshot>, DbError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT snapshot FROM compliance_snapshots WHERE broker_name = $1 AND account_id = $2 AND account_type = $3",
        )
        .bind(&scope.broker_name)
        .bind(&scope.account_id)
        .bind(account_type_str(scope.account_type))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.snapshot)?)),
            None => Ok(None),
        }
    }

    /// Upserts a bot's auto-optimizer state, keyed by `bot_id`.
    pub async fn save_optimizer_state(&self, state: &OptimizerState) -> Result<(), DbError> {
        let payload = serde_json::to_value(state)?;
        let version = tagged_version(&payload);

        sqlx::query(
            r#"
            INSERT INTO bot_optimizer_state (bot_id, version, state, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (bot_id)
            DO UPDATE SET version = EXCLUDED.version, state = EXCLUDED.state, updated_at = NOW()
            "#,
        )
        .bind(state.bot_id().as_str())
        .bind(version)
        .bind(&payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads a bot's saved optimizer state, or `Ok(None)` if it has never
    /// been optimized.
    pub async fn load_optimizer_state(&self, bot_id: &str) -> Result<Option<OptimizerState>, DbError> {
        let row = sqlx::query_as::<_, StateRow>("SELECT state FROM bot_optimizer_state WHERE bot_id = $1")
            .bind(bot_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.state)?)),
            None => Ok(None),
        }
    }

    /// Upserts a bot's configuration and last-known status, so a restart
    /// can rebuild the bot map without redeploying config files (spec §6.4
    /// "Bot map" persistence requirement).
    pub async fn save_bot(&self, bot_id: &BotId, config: &BotConfig, status: BotStatus) -> Result<(), DbError> {
        let config_json = serde_json::to_value(config)?;
        let status_json = serde_json::to_value(status)?;

        sqlx::query(
            r#"
            INSERT INTO bots (bot_id, config, status, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (bot_id)
            DO UPDATE SET config = EXCLUDED.config, status = EXCLUDED.status, updated_at = NOW()
            "#,
        )
        .bind(bot_id.as_str())
        .bind(&config_json)
        .bind(&status_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates only an already-persisted bot's status, e.g. recording the
    /// last-known state on shutdown without re-serializing its config.
    pub async fn save_bot_status(&self, bot_id: &str, status: BotStatus) -> Result<(), DbError> {
        let status_json = serde_json::to_value(status)?;

        sqlx::query("UPDATE bots SET status = $1, updated_at = NOW() WHERE bot_id = $2")
        .bind(&status_json)
        .bind(bot_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads every persisted bot (id + config + last-known status), for
    /// rebuilding the supervisor's bot map at startup.
    pub async fn load_bots(&self) -> Result<Vec<(BotId, BotConfig, BotStatus)>, DbError> {
        let rows = sqlx::query_as::<_, BotRow>("SELECT bot_id, config, status FROM bots")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let config: BotConfig = serde_json::from_value(row.config)?;
                let status: BotStatus = serde_json::from_value(row.status)?;
                Ok((row.bot_id, config, status))
            })
            .collect()
    }

    /// Removes a bot's row entirely, e.g. after a deliberate `bot remove`.
    pub async fn delete_bot(&self, bot_id: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM bots WHERE bot_id = $1").bind(bot_id).execute(&self.pool).await?;
        Ok(())
    }

    /// Timestamp the `bots` row was last written, used by the `status`
    /// subcommand to report staleness.
    pub async fn bot_last_updated(&self, bot_id: &str) -> Result<Option<DateTime<Utc>>, DbError> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as("SELECT updated_at FROM bots WHERE bot_id = $1")
            .bind(bot_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(t,)| t))
    }
}

fn account_type_str(account_type: AccountType) -> &'static str {
    match account_type {
        AccountType::Cash => "cash",
        AccountType::Margin => "margin",
        AccountType::Ira => "ira",
        AccountType::Paper => "paper",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_version_reads_the_version_field() {
        let payload = serde_json::json!({"version": "1", "foo": "bar"});
        assert_eq!(tagged_version(&payload), "1");
    }

    #[test]
    fn tagged_version_falls_back_when_absent() {
        let payload = serde_json::json!({"foo": "bar"});
        assert_eq!(tagged_version(&payload), "unknown");
    }
}
