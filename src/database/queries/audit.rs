use crate::database::models::AuditEntry;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{Executor, Sqlite};

#[derive(Debug, Default, Clone)]
pub struct AuditFilter<'a> {
    pub actor: Option<&'a str>,
    pub action: Option<&'a str>,
}

pub async fn insert_entry<'e, E>(
    executor: E,
    action: &str,
    actor: &str,
    details: Value,
    ts: DateTime<Utc>,
) -> sqlx::Result<AuditEntry>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, AuditEntry>(
        "INSERT INTO audit_log (ts, action, actor, details) VALUES (?, ?, ?, ?)
         RETURNING id, ts, action, actor, details",
    )
    .bind(ts)
    .bind(action)
    .bind(actor)
    .bind(Json(details))
    .fetch_one(executor)
    .await
}

pub async fn list_entries<'e, E>(
    executor: E,
    filter: &AuditFilter<'_>,
    limit: i64,
) -> sqlx::Result<Vec<AuditEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, AuditEntry>(
        "SELECT id, ts, action, actor, details FROM audit_log
         WHERE (?1 IS NULL OR actor = ?1)
           AND (?2 IS NULL OR action = ?2)
         ORDER BY id DESC
         LIMIT ?3",
    )
    .bind(filter.actor)
    .bind(filter.action)
    .bind(limit)
    .fetch_all(executor)
    .await
}
