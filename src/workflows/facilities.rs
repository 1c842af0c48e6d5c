use crate::database::models::{Lab, LabPc, PcStatus, Room, User};
use crate::database::queries::{facilities, sessions};
use crate::error::{PortalError, Result};
use crate::utils::validation::{require, validate_capacity};
use crate::workflows::{audit, is_unique_violation, require_admin};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityForm {
    pub name: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabDetail {
    #[serde(flatten)]
    pub lab: Lab,
    pub pcs: Vec<LabPc>,
}

fn name_taken(e: sqlx::Error, name: &str) -> PortalError {
    if is_unique_violation(&e) {
        PortalError::conflict(format!("{name} already exists"))
    } else {
        e.into()
    }
}

pub struct FacilityRegistry {
    pool: SqlitePool,
}

impl FacilityRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add_lab(&self, actor: &User, form: &FacilityForm) -> Result<LabDetail> {
        require_admin(actor, "add labs")?;
        let name = require("lab name", &form.name)?;
        validate_capacity(form.capacity)?;

        let mut tx = self.pool.begin().await?;
        let lab = facilities::insert_lab(&mut *tx, name, form.capacity)
            .await
            .map_err(|e| name_taken(e, name))?;
        facilities::insert_lab_pcs(&mut *tx, lab.id, lab.capacity).await?;
        audit::record(
            &mut *tx,
            "Lab Added",
            &actor.handle,
            json!({ "lab": lab.name, "capacity": lab.capacity }),
        )
        .await?;
        let pcs = facilities::list_pcs(&mut *tx, lab.id).await?;
        tx.commit().await?;

        info!("Lab {} added with {} PCs", lab.name, pcs.len());
        Ok(LabDetail { lab, pcs })
    }

    pub async fn rename_lab(&self, actor: &User, id: i64, name: &str) -> Result<Lab> {
        require_admin(actor, "rename labs")?;
        let name = require("lab name", name)?;

        let mut tx = self.pool.begin().await?;
        let changed = facilities::rename_lab(&mut *tx, id, name)
            .await
            .map_err(|e| name_taken(e, name))?;
        if changed == 0 {
            return Err(PortalError::not_found(format!("Lab {id} not found")));
        }
        // PC history is keyed by lab name
        let moved = sessions::rename_history_lab(&mut *tx, id, name).await?;
        tx.commit().await?;

        info!("Lab {} renamed to {} ({} history entries)", id, name, moved);
        self.get_lab(id).await.map(|detail| detail.lab)
    }

    /// Refused while any session in the lab is still active.
    pub async fn delete_lab(&self, actor: &User, id: i64) -> Result<()> {
        require_admin(actor, "delete labs")?;
        let mut tx = self.pool.begin().await?;
        sessions::deactivate_expired(&mut *tx, Utc::now()).await?;
        let active = sessions::count_active_in_lab(&mut *tx, id).await?;
        if active > 0 {
            return Err(PortalError::conflict(format!(
                "Lab {id} still has {active} active sessions"
            )));
        }
        if facilities::delete_lab(&mut *tx, id).await? == 0 {
            return Err(PortalError::not_found(format!("Lab {id} not found")));
        }
        audit::record(&mut *tx, "Lab Removed", &actor.handle, json!({ "id": id })).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn set_pc_status(
        &self,
        actor: &User,
        lab_id: i64,
        number: i64,
        status: PcStatus,
    ) -> Result<LabPc> {
        require_admin(actor, "change PC status")?;
        if facilities::set_pc_status(&self.pool, lab_id, number, status).await? == 0 {
            return Err(PortalError::not_found(format!(
                "Lab {lab_id} has no PC {number}"
            )));
        }
        facilities::get_pc(&self.pool, lab_id, number)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Lab {lab_id} has no PC {number}")))
    }

    pub async fn list_labs(&self) -> Result<Vec<Lab>> {
        Ok(facilities::list_labs(&self.pool).await?)
    }

    pub async fn get_lab(&self, id: i64) -> Result<LabDetail> {
        let lab = facilities::get_lab(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Lab {id} not found")))?;
        let pcs = facilities::list_pcs(&self.pool, lab.id).await?;
        Ok(LabDetail { lab, pcs })
    }

    pub async fn add_room(&self, actor: &User, form: &FacilityForm) -> Result<Room> {
        require_admin(actor, "add rooms")?;
        let name = require("room name", &form.name)?;
        validate_capacity(form.capacity)?;
        let room = facilities::insert_room(&self.pool, name, form.capacity)
            .await
            .map_err(|e| name_taken(e, name))?;
        audit::record(
            &self.pool,
            "Room Added",
            &actor.handle,
            json!({ "room": room.name, "capacity": room.capacity }),
        )
        .await?;
        Ok(room)
    }

    pub async fn update_room(&self, actor: &User, id: i64, form: &FacilityForm) -> Result<Room> {
        require_admin(actor, "edit rooms")?;
        let name = require("room name", &form.name)?;
        validate_capacity(form.capacity)?;
        let changed = facilities::update_room(&self.pool, id, name, form.capacity)
            .await
            .map_err(|e| name_taken(e, name))?;
        if changed == 0 {
            return Err(PortalError::not_found(format!("Room {id} not found")));
        }
        facilities::get_room(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Room {id} not found")))
    }

    pub async fn delete_room(&self, actor: &User, id: i64) -> Result<()> {
        require_admin(actor, "delete rooms")?;
        if facilities::delete_room(&self.pool, id).await? == 0 {
            return Err(PortalError::not_found(format!("Room {id} not found")));
        }
        audit::record(&self.pool, "Room Removed", &actor.handle, json!({ "id": id })).await?;
        Ok(())
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>> {
        Ok(facilities::list_rooms(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;
    use crate::database::models::Role;

    fn admin() -> User {
        User {
            handle: "admin".to_string(),
            name: "Administrator".to_string(),
            email: "admin@test".to_string(),
            role: Role::Admin,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn labs_get_numbered_pcs_and_unique_names() {
        let registry = FacilityRegistry::new(connect_in_memory().await.unwrap());
        let admin = admin();
        let form = FacilityForm {
            name: "Mac Lab".to_string(),
            capacity: 3,
        };

        let detail = registry.add_lab(&admin, &form).await.unwrap();
        let numbers: Vec<i64> = detail.pcs.iter().map(|pc| pc.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        assert!(matches!(
            registry.add_lab(&admin, &form).await.unwrap_err(),
            PortalError::Conflict(_)
        ));

        let zero = FacilityForm {
            name: "Empty".to_string(),
            capacity: 0,
        };
        assert!(matches!(
            registry.add_lab(&admin, &zero).await.unwrap_err(),
            PortalError::Validation(_)
        ));

        let pc = registry
            .set_pc_status(&admin, detail.lab.id, 2, PcStatus::OutOfService)
            .await
            .unwrap();
        assert_eq!(pc.status, PcStatus::OutOfService);

        let renamed = registry.rename_lab(&admin, detail.lab.id, "iMac Lab").await.unwrap();
        assert_eq!(renamed.name, "iMac Lab");
        registry.delete_lab(&admin, detail.lab.id).await.unwrap();
        assert!(registry.list_labs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rooms_are_admin_only() {
        let registry = FacilityRegistry::new(connect_in_memory().await.unwrap());
        let mut teacher = admin();
        teacher.role = Role::Teacher;
        let form = FacilityForm {
            name: "Room 301".to_string(),
            capacity: 25,
        };
        assert!(matches!(
            registry.add_room(&teacher, &form).await.unwrap_err(),
            PortalError::Forbidden(_)
        ));

        let room = registry.add_room(&admin(), &form).await.unwrap();
        let updated = registry
            .update_room(
                &admin(),
                room.id,
                &FacilityForm {
                    name: "Room 301A".to_string(),
                    capacity: 30,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.capacity, 30);
        registry.delete_room(&admin(), room.id).await.unwrap();
        assert!(registry.list_rooms().await.unwrap().is_empty());
    }
}
