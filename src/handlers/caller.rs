use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::domain::{User, UserRole};
use crate::error::AppError;
use crate::AppState;

pub const CALLER_HEADER: &str = "x-user-id";

/// Caller identifier taken from the `x-user-id` header: an email address
/// or a user id. Authentication happens upstream.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl Caller {
    pub fn identifier(&self) -> &str {
        &self.0
    }

    /// Resolve to a stored user. Unknown callers are unauthorized.
    pub async fn user(&self, state: &AppState) -> Result<User, AppError> {
        match state.services.identity.resolve(&self.0).await {
            Err(AppError::NotFound(_)) => Err(AppError::Unauthorized(format!(
                "Unknown caller: {}",
                self.0
            ))),
            other => other,
        }
    }

    pub async fn user_id(&self, state: &AppState) -> Result<Uuid, AppError> {
        Ok(self.user(state).await?.id)
    }

    /// Resolve the caller and require the ADMIN role.
    pub async fn admin(&self, state: &AppState) -> Result<User, AppError> {
        let user = self.user(state).await?;
        if user.role != UserRole::Admin {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        Ok(user)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let identifier = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", CALLER_HEADER)))?;

        Ok(Caller(identifier.to_string()))
    }
}
