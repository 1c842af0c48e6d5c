use crate::config::Config;
use crate::database::models::Role;
use crate::database::queries::{facilities, subjects, users};
use crate::utils::password::hash_password;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

const DEFAULT_ACCOUNTS: &[(&str, &str, &str, Role)] = &[
    ("admin", "Administrator", "admin123", Role::Admin),
    ("library", "Library Admin", "library123", Role::LibraryAdmin),
];

const DEFAULT_LABS: &[(&str, i64)] = &[("Super Lab", 40), ("Computer Lab", 40), ("Internet Lab", 20)];

const DEFAULT_ROOMS: &[(&str, i64)] = &[("Room 101", 30), ("Room 102", 35), ("Room 201", 40)];

/// Populates an empty database with the default accounts, admin subjects,
/// labs and rooms. Does nothing once any user exists.
pub async fn seed_defaults(pool: &SqlitePool, config: &Config) -> Result<bool> {
    if users::count_users(pool).await? > 0 {
        return Ok(false);
    }

    info!("Seeding default accounts and facilities...");
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    for (handle, name, password, role) in DEFAULT_ACCOUNTS {
        let email = format!("{}@{}", handle, config.email_domain);
        let password_hash = hash_password(password);
        users::insert_user(
            &mut *tx,
            &users::NewUser {
                handle,
                name,
                email: &email,
                role: *role,
                password_hash: &password_hash,
            },
            now,
        )
        .await?;
    }

    // The personal-use teacher owns "Exam" and the personal-use subject.
    if DEFAULT_ACCOUNTS
        .iter()
        .any(|(handle, ..)| *handle == config.personal_use.teacher)
    {
        for subject in ["Exam", config.personal_use.subject.as_str()] {
            subjects::insert_subject(&mut *tx, &config.personal_use.teacher, subject).await?;
        }
    }

    for (name, capacity) in DEFAULT_LABS {
        let lab = facilities::insert_lab(&mut *tx, name, *capacity).await?;
        facilities::insert_lab_pcs(&mut *tx, lab.id, lab.capacity).await?;
    }

    for (name, capacity) in DEFAULT_ROOMS {
        facilities::insert_room(&mut *tx, name, *capacity).await?;
    }

    tx.commit().await?;
    info!(
        "Seeded {} accounts, {} labs and {} rooms",
        DEFAULT_ACCOUNTS.len(),
        DEFAULT_LABS.len(),
        DEFAULT_ROOMS.len()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;
    use crate::utils::password::verify_password;

    #[tokio::test]
    async fn seeds_once_into_an_empty_database() {
        let pool = connect_in_memory().await.unwrap();
        let config = Config::default();

        assert!(seed_defaults(&pool, &config).await.unwrap());
        assert!(!seed_defaults(&pool, &config).await.unwrap());

        let admin = users::find_by_handle(&pool, "admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(verify_password("admin123", &admin.password_hash));

        let labs = facilities::list_labs(&pool).await.unwrap();
        assert_eq!(labs.len(), 3);
        let super_lab = facilities::find_lab_by_name(&pool, "Super Lab")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(facilities::list_pcs(&pool, super_lab.id).await.unwrap().len(), 40);

        let admin_subjects = subjects::list_subjects(&pool, Some("admin")).await.unwrap();
        let names: Vec<_> = admin_subjects.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Exam", "Personal Use"]);
    }
}
