use crate::database::models::{AuditEntry, User};
use crate::database::queries::audit::{self, AuditFilter};
use crate::error::Result;
use crate::workflows::require_admin;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool};

pub const DEFAULT_LIMIT: i64 = 200;

/// Appends an audit entry using the caller's executor, usually the
/// transaction that performed the audited change.
pub async fn record<'e, E>(executor: E, action: &str, actor: &str, details: Value) -> Result<AuditEntry>
where
    E: Executor<'e, Database = Sqlite>,
{
    let entry = audit::insert_entry(executor, action, actor, details, Utc::now()).await?;
    tracing::debug!("audit: {} by {}", entry.action, entry.actor);
    Ok(entry)
}

pub struct AuditLog {
    pool: SqlitePool,
}

impl AuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest first.
    pub async fn list(
        &self,
        actor: &User,
        filter: &AuditFilter<'_>,
        limit: Option<i64>,
    ) -> Result<Vec<AuditEntry>> {
        require_admin(actor, "read the audit log")?;
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 1000);
        Ok(audit::list_entries(&self.pool, filter, limit).await?)
    }
}
