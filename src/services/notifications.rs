use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Notification, NotificationType};
use crate::error::AppError;
use crate::ports::NotificationRepository;

/// Persists notification records for lifecycle events.
///
/// `notify` never fails the caller: a storage error is logged and dropped.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationDispatcher {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    pub async fn notify(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        related_entity_id: Option<Uuid>,
    ) {
        let notification =
            Notification::new(user_id, notification_type, title, message, related_entity_id);

        match self.notifications.insert(&notification).await {
            Ok(saved) => tracing::debug!(
                notification_id = %saved.id,
                user_id = %user_id,
                kind = %notification_type,
                "Notification recorded"
            ),
            Err(e) => tracing::warn!(
                user_id = %user_id,
                kind = %notification_type,
                error = %e,
                "Failed to record notification"
            ),
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        Ok(self.notifications.list_by_user(user_id).await?)
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Notification, AppError> {
        let mut notification = self
            .notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification not found: {}", id)))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only mark your own notifications as read".to_string(),
            ));
        }

        if notification.is_read {
            return Ok(notification);
        }

        notification.is_read = true;
        Ok(self.notifications.update(&notification).await?)
    }
}
