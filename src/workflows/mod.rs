//! Domain workflows. Each holds a pool handle and runs every state
//! transition in one transaction guarded by a conditional update.

pub mod audit;
pub mod booking;
pub mod dashboard;
pub mod enrollment;
pub mod facilities;
pub mod identity;
pub mod lending;
pub mod schedule;
pub mod sessions;
pub mod subjects;

use crate::database::models::{Role, User};
use crate::error::{PortalError, Result};

pub(crate) fn require_role(actor: &User, allowed: bool, action: &str) -> Result<()> {
    if allowed {
        Ok(())
    } else {
        Err(PortalError::forbidden(format!(
            "{} ({}) is not allowed to {}",
            actor.handle, actor.role, action
        )))
    }
}

pub(crate) fn require_admin(actor: &User, action: &str) -> Result<()> {
    require_role(actor, actor.role == Role::Admin, action)
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
