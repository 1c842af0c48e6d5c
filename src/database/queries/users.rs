use crate::database::models::{Role, User};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

pub struct NewUser<'a> {
    pub handle: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub role: Role,
    pub password_hash: &'a str,
}

pub async fn insert_user<'e, E>(
    executor: E,
    user: &NewUser<'_>,
    created_at: DateTime<Utc>,
) -> sqlx::Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(
        "INSERT INTO users (handle, name, email, role, password_hash, created_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING handle, name, email, role, password_hash, created_at",
    )
    .bind(user.handle)
    .bind(user.name)
    .bind(user.email)
    .bind(user.role)
    .bind(user.password_hash)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

pub async fn find_by_handle<'e, E>(executor: E, handle: &str) -> sqlx::Result<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(
        "SELECT handle, name, email, role, password_hash, created_at FROM users WHERE handle = ?",
    )
    .bind(handle)
    .fetch_optional(executor)
    .await
}

pub async fn list_users<'e, E>(executor: E, role: Option<Role>) -> sqlx::Result<Vec<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(
        "SELECT handle, name, email, role, password_hash, created_at FROM users
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY role ASC, handle ASC",
    )
    .bind(role)
    .fetch_all(executor)
    .await
}

pub async fn delete_user<'e, E>(executor: E, handle: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM users WHERE handle = ?")
        .bind(handle)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_by_role<'e, E>(executor: E) -> sqlx::Result<Vec<(Role, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (Role, i64)>("SELECT role, COUNT(*) FROM users GROUP BY role")
        .fetch_all(executor)
        .await
}

pub async fn count_users<'e, E>(executor: E) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await
}
