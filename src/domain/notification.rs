use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ApplicationUpdate,
    PaymentRequest,
    PaymentReceived,
    SystemAlert,
    DocumentRequired,
}

text_enum!(NotificationType {
    ApplicationUpdate => "APPLICATION_UPDATE",
    PaymentRequest => "PAYMENT_REQUEST",
    PaymentReceived => "PAYMENT_RECEIVED",
    SystemAlert => "SYSTEM_ALERT",
    DocumentRequired => "DOCUMENT_REQUIRED",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_entity_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        related_entity_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            notification_type,
            title: title.into(),
            message: message.into(),
            related_entity_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
