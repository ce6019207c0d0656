use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::domain::Notification;
use crate::error::AppError;
use crate::handlers::caller::Caller;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "Caller's notifications, newest first", body = [Notification])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Notification>>, AppError> {
    let user_id = caller.user_id(&state).await?;
    Ok(Json(state.services.notifications.list_for_user(user_id).await?))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 403, description = "Not the recipient")
    ),
    tag = "Notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let user_id = caller.user_id(&state).await?;
    Ok(Json(state.services.notifications.mark_read(id, user_id).await?))
}
