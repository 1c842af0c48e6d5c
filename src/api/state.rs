use crate::config::Config;
use crate::workflows::audit::AuditLog;
use crate::workflows::booking::BookingWorkflow;
use crate::workflows::dashboard::Dashboard;
use crate::workflows::enrollment::EnrollmentWorkflow;
use crate::workflows::facilities::FacilityRegistry;
use crate::workflows::identity::Identity;
use crate::workflows::lending::LendingDesk;
use crate::workflows::schedule::ScheduleBoard;
use crate::workflows::sessions::SessionManager;
use crate::workflows::subjects::SubjectCatalog;
use sqlx::SqlitePool;

/// Application state shared across all handlers. Workflows are cheap
/// wrappers around the pool and are built per request.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self { pool, config }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.pool.clone(), self.config.clone())
    }

    pub fn audit(&self) -> AuditLog {
        AuditLog::new(self.pool.clone())
    }

    pub fn subjects(&self) -> SubjectCatalog {
        SubjectCatalog::new(self.pool.clone())
    }

    pub fn enrollment(&self) -> EnrollmentWorkflow {
        EnrollmentWorkflow::new(self.pool.clone())
    }

    pub fn booking(&self) -> BookingWorkflow {
        BookingWorkflow::new(self.pool.clone(), self.config.clone())
    }

    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(self.pool.clone())
    }

    pub fn facilities(&self) -> FacilityRegistry {
        FacilityRegistry::new(self.pool.clone())
    }

    pub fn lending(&self) -> LendingDesk {
        LendingDesk::new(self.pool.clone(), self.config.clone())
    }

    pub fn schedule(&self) -> ScheduleBoard {
        ScheduleBoard::new(self.pool.clone(), self.config.clone())
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.pool.clone())
    }
}
