#![allow(dead_code)]

use lab_portal::config::Config;
use lab_portal::database::models::{Role, User};
use lab_portal::database::{connect_in_memory, seed::seed_defaults};
use lab_portal::workflows::identity::{Identity, RegisterForm};
use sqlx::SqlitePool;

pub struct Portal {
    pub pool: SqlitePool,
    pub config: Config,
}

impl Portal {
    /// A seeded in-memory portal with the default accounts and facilities.
    pub async fn seeded() -> Self {
        let pool = connect_in_memory().await.unwrap();
        let config = Config::default();
        seed_defaults(&pool, &config).await.unwrap();
        Self { pool, config }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.pool.clone(), self.config.clone())
    }

    pub async fn user(&self, handle: &str) -> User {
        self.identity().get_user(handle).await.unwrap()
    }

    pub async fn student(&self, handle: &str, name: &str) -> User {
        self.identity()
            .register(&form(handle, name, Role::Student, None))
            .await
            .unwrap()
    }

    pub async fn teacher(&self, handle: &str, name: &str) -> User {
        let code = self.config.teacher_registration_code.clone();
        self.identity()
            .register(&form(handle, name, Role::Teacher, Some(code)))
            .await
            .unwrap()
    }
}

pub fn form(handle: &str, name: &str, role: Role, code: Option<String>) -> RegisterForm {
    RegisterForm {
        handle: handle.to_string(),
        name: name.to_string(),
        password: "password".to_string(),
        role,
        email: None,
        registration_code: code,
    }
}
