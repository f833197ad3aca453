//! Key/value feature flags with defaulted reads and upsert writes.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error::CoreError;
use crate::outcome::Outcome;
use schoolhub_db::entities::system_setting;

/// Whether students may submit inquiries (`"1"` / `"0"`).
pub const STUDENT_INQUIRIES_ENABLED: &str = "student_inquiries_enabled";
/// Whether teachers may submit inquiries (`"1"` / `"0"`).
pub const TEACHER_INQUIRIES_ENABLED: &str = "teacher_inquiries_enabled";

#[derive(Clone)]
pub struct SettingsStore {
    db: DatabaseConnection,
}

impl SettingsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stored value for `key`, or `default` when the key is absent.
    ///
    /// A storage failure also yields `default`, marked as degraded.
    pub async fn get(&self, key: &str, default: &str) -> Outcome<String> {
        match find(&self.db, key).await {
            Ok(Some(setting)) => Outcome::fresh(setting.value),
            Ok(None) => Outcome::fresh(default.to_string()),
            Err(e) => {
                tracing::warn!(key, "setting lookup failed, using default: {e}");
                Outcome::degraded(
                    default.to_string(),
                    format!("setting '{key}' could not be read; using default"),
                )
            }
        }
    }

    /// The full row for `key`, if present. Unlike `get`, storage errors are
    /// returned to the caller.
    pub async fn lookup(&self, key: &str) -> Result<Option<system_setting::Model>, CoreError> {
        Ok(find(&self.db, key).await?)
    }

    /// `get` interpreted as an on/off flag.
    pub async fn get_flag(&self, key: &str, default: bool) -> Outcome<bool> {
        let fallback = if default { "1" } else { "0" };
        self.get(key, fallback).await.map(|v| parse_flag(&v))
    }

    /// Insert `key` or update it in place. The description is only replaced
    /// when a non-blank one is given. Runs in one transaction; on error nothing changes.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<(), CoreError> {
        let txn = self.db.begin().await?;

        match upsert(&txn, key, value, description).await {
            Ok(()) => {
                txn.commit().await?;
                tracing::debug!(key, "setting saved");
                Ok(())
            }
            Err(e) => {
                tracing::error!(key, "failed to save setting: {e}");
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(key, "rollback after failed setting write: {rollback_err}");
                }
                Err(e.into())
            }
        }
    }

    /// Every setting, ordered by key.
    pub async fn list(&self) -> Result<Vec<system_setting::Model>, CoreError> {
        let settings = system_setting::Entity::find()
            .order_by_asc(system_setting::Column::Key)
            .all(&self.db)
            .await?;
        Ok(settings)
    }
}

async fn find<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> Result<Option<system_setting::Model>, DbErr> {
    system_setting::Entity::find()
        .filter(system_setting::Column::Key.eq(key))
        .one(conn)
        .await
}

async fn upsert<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    value: &str,
    description: Option<&str>,
) -> Result<(), DbErr> {
    let now = chrono::Utc::now().fixed_offset();
    let description = description.filter(|d| !d.trim().is_empty());

    match find(conn, key).await? {
        Some(existing) => {
            let mut am: system_setting::ActiveModel = existing.into();
            am.value = Set(value.to_string());
            if let Some(description) = description {
                am.description = Set(Some(description.to_string()));
            }
            am.updated_at = Set(now);
            am.update(conn).await?;
        }
        None => {
            system_setting::ActiveModel {
                id: Set(Uuid::new_v4()),
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                description: Set(description.map(str::to_string)),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

/// `"1"`, `"true"`, `"yes"` and `"on"` (any case) are on; everything else is off.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
