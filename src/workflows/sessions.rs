use crate::database::models::{PcHistoryEntry, PcStatus, Role, Session, User};
use crate::database::queries::facilities;
use crate::database::queries::sessions::{self, SessionFilter};
use crate::error::{PortalError, Result};
use crate::workflows::{audit, require_role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashMap;

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Status of a PC as seen on the lab board. `InUse` is never stored; it
/// comes from an active session on that PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PcAvailability {
    Available,
    InUse,
    OutOfService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcState {
    pub number: i64,
    pub status: PcAvailability,
    pub session: Option<Session>,
}

pub struct SessionManager {
    pool: SqlitePool,
}

impl SessionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Deactivates sessions whose end time has passed. Runs before every read.
    pub async fn close_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let closed = sessions::deactivate_expired(&self.pool, now).await?;
        if closed > 0 {
            tracing::info!("Closed {} expired sessions", closed);
        }
        Ok(closed)
    }

    /// Manual end by the session's student, its teacher, or an admin.
    pub async fn end_session(&self, actor: &User, id: i64) -> Result<Session> {
        let session = sessions::get_session(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Session {id} not found")))?;
        require_role(
            actor,
            session.student == actor.handle
                || session.teacher == actor.handle
                || actor.role == Role::Admin,
            "end someone else's session",
        )?;

        let mut tx = self.pool.begin().await?;
        if sessions::deactivate_session(&mut *tx, id, Utc::now()).await? == 0 {
            return Err(PortalError::conflict(format!("Session {id} has already ended")));
        }
        audit::record(
            &mut *tx,
            "Session Ended",
            &actor.handle,
            json!({ "id": id, "student": session.student, "resource": session.resource_name }),
        )
        .await?;
        let ended = sessions::get_session(&mut *tx, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Session {id} not found")))?;
        tx.commit().await?;

        tracing::info!("Session {} ended by {}", id, actor.handle);
        Ok(ended)
    }

    /// Scoped by role: students see their own, teachers their classes,
    /// admins the whole attendance report.
    pub async fn list(&self, actor: &User, active_only: bool) -> Result<Vec<Session>> {
        self.close_expired(Utc::now()).await?;
        let filter = match actor.role {
            Role::Student => SessionFilter {
                student: Some(&actor.handle),
                active_only,
                ..Default::default()
            },
            Role::Teacher => SessionFilter {
                teacher: Some(&actor.handle),
                active_only,
                ..Default::default()
            },
            Role::Admin => SessionFilter {
                active_only,
                ..Default::default()
            },
            Role::LibraryAdmin => {
                return Err(PortalError::forbidden("Library admins have no sessions to view"));
            }
        };
        Ok(sessions::list_sessions(&self.pool, &filter).await?)
    }

    pub async fn lab_status(&self, lab_id: i64) -> Result<Vec<PcState>> {
        let lab = facilities::get_lab(&self.pool, lab_id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Lab {lab_id} not found")))?;
        self.close_expired(Utc::now()).await?;

        let filter = SessionFilter {
            lab_id: Some(lab.id),
            active_only: true,
            ..Default::default()
        };
        let mut occupants: HashMap<i64, Session> = sessions::list_sessions(&self.pool, &filter)
            .await?
            .into_iter()
            .filter_map(|s| s.pc_number.map(|pc| (pc, s)))
            .collect();

        Ok(facilities::list_pcs(&self.pool, lab.id)
            .await?
            .into_iter()
            .map(|pc| {
                let session = occupants.remove(&pc.number);
                let status = match (pc.status, &session) {
                    (PcStatus::OutOfService, _) => PcAvailability::OutOfService,
                    (PcStatus::Available, Some(_)) => PcAvailability::InUse,
                    (PcStatus::Available, None) => PcAvailability::Available,
                };
                PcState {
                    number: pc.number,
                    status,
                    session,
                }
            })
            .collect())
    }

    /// Usage of one PC, newest first.
    pub async fn pc_history(
        &self,
        lab_id: i64,
        pc_number: i64,
        limit: Option<i64>,
    ) -> Result<Vec<PcHistoryEntry>> {
        let lab = facilities::get_lab(&self.pool, lab_id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Lab {lab_id} not found")))?;
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(1);
        Ok(sessions::pc_history(&self.pool, &lab.name, pc_number, limit).await?)
    }
}
