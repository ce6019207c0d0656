//! Resolution of caller identifiers (email or UUID) to stored users.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{PersonalInfo, User};
use crate::error::AppError;
use crate::ports::UserRepository;

#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Look up a user by id, or by email when the identifier is not a UUID.
    pub async fn find(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let identifier = identifier.trim();
        let user = match Uuid::parse_str(identifier) {
            Ok(id) => self.users.find_by_id(id).await?,
            Err(_) => self.users.find_by_email(identifier).await?,
        };
        Ok(user)
    }

    pub async fn resolve(&self, identifier: &str) -> Result<User, AppError> {
        self.find(identifier)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", identifier)))
    }

    pub async fn resolve_id(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", id)))
    }

    /// Resolve an applicant, registering a partner account on first contact
    /// by an unknown email address.
    pub async fn resolve_or_register_partner(
        &self,
        identifier: &str,
        personal_info: Option<&PersonalInfo>,
    ) -> Result<User, AppError> {
        if let Some(user) = self.find(identifier).await? {
            return Ok(user);
        }

        let identifier = identifier.trim();
        if !looks_like_email(identifier) {
            return Err(AppError::NotFound(format!("User not found: {}", identifier)));
        }

        let user = User::partner_from_application(identifier, personal_info);
        let user = self.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, "Registered partner account on first application");
        Ok(user)
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}
