use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::application::PersonalInfo;
use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Business,
    Partner,
    Admin,
}

text_enum!(UserRole {
    Business => "BUSINESS",
    Partner => "PARTNER",
    Admin => "ADMIN",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: String::new(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Minimal partner account registered on a first application by a user
    /// that has no stored record yet.
    pub fn partner_from_application(email: &str, personal_info: Option<&PersonalInfo>) -> Self {
        let first_name = personal_info
            .and_then(|info| info.first_name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let last_name = personal_info
            .and_then(|info| info.last_name.clone())
            .unwrap_or_else(|| "User".to_string());
        let phone = personal_info
            .and_then(|info| info.phone.clone())
            .unwrap_or_default();

        let mut user = Self::new(email, first_name, last_name, UserRole::Partner);
        user.phone = phone;
        user
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_reviewer(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Business)
    }
}
