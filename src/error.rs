use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, PortalError>;

/// Every failure a portal operation can surface. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("remote portal unavailable: {0}")]
    Transport(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PortalError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PortalError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        PortalError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        PortalError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        PortalError::Forbidden(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Conflict(_) => StatusCode::CONFLICT,
            PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
            PortalError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PortalError::Transport(_) => StatusCode::BAD_GATEWAY,
            PortalError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a remote `{error}` reply back onto the taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => PortalError::Validation(message),
            StatusCode::UNAUTHORIZED => PortalError::Unauthorized(message),
            StatusCode::FORBIDDEN => PortalError::Forbidden(message),
            StatusCode::NOT_FOUND => PortalError::NotFound(message),
            StatusCode::CONFLICT => PortalError::Conflict(message),
            other => PortalError::Transport(format!("{other}: {message}")),
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            PortalError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error occurred".to_string()
            }
            PortalError::Transport(msg) => {
                tracing::warn!("Transport error: {}", msg);
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(PortalError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PortalError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PortalError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(PortalError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn remote_statuses_map_back() {
        let err = PortalError::from_status(StatusCode::CONFLICT, "taken".into());
        assert!(matches!(err, PortalError::Conflict(ref m) if m == "taken"));

        let err = PortalError::from_status(StatusCode::SERVICE_UNAVAILABLE, "down".into());
        assert!(matches!(err, PortalError::Transport(_)));
    }
}
