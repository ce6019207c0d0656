use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Notification;
use crate::ports::{NotificationRepository, RepositoryError, RepositoryResult};

#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(NotificationRow::into_domain).transpose()
    }

    async fn insert(&self, notification: &Notification) -> RepositoryResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (
                id, user_id, notification_type, title, message, related_entity_id, is_read, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_entity_id)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn update(&self, notification: &Notification) -> RepositoryResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET is_read = $2 WHERE id = $1 RETURNING *",
        )
        .bind(notification.id)
        .bind(notification.is_read)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(format!("notification {}", notification.id)))?
            .into_domain()
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NotificationRow::into_domain).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    notification_type: String,
    title: String,
    message: String,
    related_entity_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_domain(self) -> RepositoryResult<Notification> {
        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            notification_type: self.notification_type.parse()?,
            title: self.title,
            message: self.message,
            related_entity_id: self.related_entity_id,
            is_read: self.is_read,
            created_at: self.created_at,
        })
    }
}
