use crate::api::state::AppState;
use crate::backend::remote::ACTOR_HEADER;
use crate::database::models::User;
use crate::error::PortalError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// The user a request acts for, named by the `X-User` header.
#[derive(Debug, Clone)]
pub struct Actor(pub User);

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let handle = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| PortalError::Unauthorized(format!("Missing {ACTOR_HEADER} header")))?;

        let user = state.identity().resolve_actor(handle).await?;
        Ok(Actor(user))
    }
}
