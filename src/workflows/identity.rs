use crate::config::Config;
use crate::database::models::{Role, User};
use crate::database::queries::users::{self, NewUser};
use crate::error::{PortalError, Result};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validation::{optional_text, require};
use crate::workflows::{audit, is_unique_violation, require_admin};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

const BAD_CREDENTIALS: &str = "Invalid handle or password";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub handle: String,
    pub name: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub registration_code: Option<String>,
}

pub struct Identity {
    pool: SqlitePool,
    config: Config,
}

impl Identity {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self { pool, config }
    }

    /// Self-service sign up for students and teachers.
    pub async fn register(&self, form: &RegisterForm) -> Result<User> {
        match form.role {
            Role::Student => {}
            Role::Teacher => {
                let code = optional_text(form.registration_code.as_deref());
                if code != Some(self.config.teacher_registration_code.as_str()) {
                    return Err(PortalError::validation("Invalid teacher registration code"));
                }
            }
            Role::Admin | Role::LibraryAdmin => {
                return Err(PortalError::forbidden(format!(
                    "{} accounts can only be created by an administrator",
                    form.role
                )));
            }
        }
        let user = self.insert(form).await?;
        audit::record(&self.pool, "Sign Up", &user.handle, json!({ "role": user.role })).await?;
        info!("Registered {} as {}", user.handle, user.role);
        Ok(user)
    }

    /// Admin-only account creation for any role.
    pub async fn create_user(&self, actor: &User, form: &RegisterForm) -> Result<User> {
        require_admin(actor, "create accounts")?;
        let user = self.insert(form).await?;
        audit::record(
            &self.pool,
            "User Created",
            &actor.handle,
            json!({ "handle": user.handle, "role": user.role }),
        )
        .await?;
        info!("{} created {} as {}", actor.handle, user.handle, user.role);
        Ok(user)
    }

    async fn insert(&self, form: &RegisterForm) -> Result<User> {
        let handle = require("handle", &form.handle)?;
        let name = require("name", &form.name)?;
        let password = require("password", &form.password)?;

        if users::find_by_handle(&self.pool, handle).await?.is_some() {
            return Err(PortalError::conflict(format!("User {handle} already exists")));
        }

        let email = match optional_text(form.email.as_deref()) {
            Some(email) => email.to_string(),
            None => self.derived_email(handle, name),
        };
        let password_hash = hash_password(password);

        let new_user = NewUser {
            handle,
            name,
            email: &email,
            role: form.role,
            password_hash: &password_hash,
        };
        users::insert_user(&self.pool, &new_user, Utc::now())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortalError::conflict(format!("User {handle} already exists"))
                } else {
                    e.into()
                }
            })
    }

    fn derived_email(&self, handle: &str, name: &str) -> String {
        let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        format!("{}_{}@{}", handle, compact, self.config.email_domain)
    }

    pub async fn login(&self, handle: &str, password: &str) -> Result<User> {
        let user = users::find_by_handle(&self.pool, handle.trim())
            .await?
            .filter(|user| verify_password(password, &user.password_hash))
            .ok_or_else(|| PortalError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

        audit::record(&self.pool, "Sign In", &user.handle, json!({})).await?;
        Ok(user)
    }

    pub async fn logout(&self, actor: &User) -> Result<()> {
        audit::record(&self.pool, "Sign Out", &actor.handle, json!({})).await?;
        Ok(())
    }

    pub async fn get_user(&self, handle: &str) -> Result<User> {
        users::find_by_handle(&self.pool, handle)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("User {handle} not found")))
    }

    /// The acting user behind a request; unknown handles are unauthorized.
    pub async fn resolve_actor(&self, handle: &str) -> Result<User> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(PortalError::Unauthorized("Sign in first".to_string()));
        }
        users::find_by_handle(&self.pool, handle)
            .await?
            .ok_or_else(|| PortalError::Unauthorized(format!("Unknown user {handle}")))
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        Ok(users::list_users(&self.pool, role).await?)
    }

    pub async fn delete_user(&self, actor: &User, handle: &str) -> Result<()> {
        require_admin(actor, "delete accounts")?;
        if actor.handle == handle {
            return Err(PortalError::validation("You cannot delete your own account"));
        }

        let mut tx = self.pool.begin().await?;
        if users::delete_user(&mut *tx, handle).await? == 0 {
            return Err(PortalError::not_found(format!("User {handle} not found")));
        }
        audit::record(&mut *tx, "User Deleted", &actor.handle, json!({ "handle": handle })).await?;
        tx.commit().await?;

        info!("{} deleted user {}", actor.handle, handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;
    use crate::database::seed::seed_defaults;

    fn form(handle: &str, name: &str, role: Role) -> RegisterForm {
        RegisterForm {
            handle: handle.to_string(),
            name: name.to_string(),
            password: "secret".to_string(),
            role,
            email: None,
            registration_code: None,
        }
    }

    async fn identity() -> Identity {
        let pool = connect_in_memory().await.unwrap();
        let config = Config::default();
        seed_defaults(&pool, &config).await.unwrap();
        Identity::new(pool, config)
    }

    #[tokio::test]
    async fn students_register_with_a_derived_email() {
        let identity = identity().await;
        let user = identity.register(&form("S001", "Ana Cruz", Role::Student)).await.unwrap();
        assert_eq!(user.email, "S001_AnaCruz@amacc_lipa.com");

        let err = identity.register(&form("S001", "Ana", Role::Student)).await.unwrap_err();
        assert!(matches!(err, PortalError::Conflict(_)));
    }

    #[tokio::test]
    async fn teachers_need_the_registration_code() {
        let identity = identity().await;
        let mut teacher = form("T01", "Ben", Role::Teacher);
        let err = identity.register(&teacher).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));

        teacher.registration_code = Some("AMACC2025".to_string());
        assert_eq!(identity.register(&teacher).await.unwrap().role, Role::Teacher);
    }

    #[tokio::test]
    async fn privileged_roles_cannot_self_register() {
        let identity = identity().await;
        let err = identity.register(&form("boss", "Boss", Role::Admin)).await.unwrap_err();
        assert!(matches!(err, PortalError::Forbidden(_)));

        let admin = identity.get_user("admin").await.unwrap();
        let created = identity
            .create_user(&admin, &form("lib2", "Second Librarian", Role::LibraryAdmin))
            .await
            .unwrap();
        assert_eq!(created.role, Role::LibraryAdmin);
    }

    #[tokio::test]
    async fn login_checks_the_hash_with_one_message() {
        let identity = identity().await;
        assert_eq!(identity.login("admin", "admin123").await.unwrap().handle, "admin");

        let wrong = identity.login("admin", "nope").await.unwrap_err();
        let unknown = identity.login("ghost", "admin123").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, PortalError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn admins_delete_others_but_not_themselves() {
        let identity = identity().await;
        let admin = identity.get_user("admin").await.unwrap();
        identity.register(&form("S002", "Cy", Role::Student)).await.unwrap();

        assert!(identity.delete_user(&admin, "admin").await.is_err());
        identity.delete_user(&admin, "S002").await.unwrap();
        assert!(matches!(
            identity.get_user("S002").await.unwrap_err(),
            PortalError::NotFound(_)
        ));
    }
}
