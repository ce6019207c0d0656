use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FranchiseStatus {
    Active,
    Inactive,
    Pending,
    Suspended,
}

text_enum!(FranchiseStatus {
    Active => "ACTIVE",
    Inactive => "INACTIVE",
    Pending => "PENDING",
    Suspended => "SUSPENDED",
});

/// Catalog entry consulted by the application and payment workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Franchise {
    pub id: Uuid,
    pub name: String,
    pub business_owner_id: Uuid,
    pub status: FranchiseStatus,
    #[schema(value_type = String)]
    pub franchise_fee: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Franchise {
    pub fn new(
        name: impl Into<String>,
        business_owner_id: Uuid,
        status: FranchiseStatus,
        franchise_fee: BigDecimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            business_owner_id,
            status,
            franchise_fee,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn accepts_applications(&self) -> bool {
        self.status == FranchiseStatus::Active
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.business_owner_id == user_id
    }
}
