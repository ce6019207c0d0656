use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationDocument, ApplicationDraft, ApplicationPatch, ApplicationStatus,
    NewDocument, UserRole,
};
use crate::error::AppError;
use crate::handlers::caller::Caller;
use crate::services::ApplicationStats;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationQuery {
    pub franchise_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

#[utoipa::path(
    post,
    path = "/applications",
    params(
        ("franchise_id" = Uuid, Query, description = "Franchise applied for"),
        ("x-user-id" = String, Header, description = "Applicant email or id")
    ),
    request_body = ApplicationDraft,
    responses(
        (status = 201, description = "Application created", body = Application),
        (status = 403, description = "Caller is not a partner"),
        (status = 404, description = "Franchise not found"),
        (status = 409, description = "Active application already exists"),
        (status = 422, description = "Franchise is not accepting applications")
    ),
    tag = "Applications"
)]
pub async fn create_application(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<CreateApplicationQuery>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<impl IntoResponse, AppError> {
    let application = state
        .services
        .applications
        .create_application(draft, caller.identifier(), query.franchise_id)
        .await?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// Applications submitted by the caller.
#[utoipa::path(
    get,
    path = "/applications",
    responses((status = 200, description = "Caller's applications", body = [Application])),
    tag = "Applications"
)]
pub async fn list_my_applications(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Application>>, AppError> {
    let applications = state
        .services
        .applications
        .list_by_applicant(caller.identifier())
        .await?;
    Ok(Json(applications))
}

/// Applications against franchises the caller owns.
#[utoipa::path(
    get,
    path = "/applications/received",
    responses((status = 200, description = "Applications for the caller's franchises", body = [Application])),
    tag = "Applications"
)]
pub async fn list_received_applications(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Application>>, AppError> {
    let applications = state
        .services
        .applications
        .list_for_business_owner(caller.identifier())
        .await?;
    Ok(Json(applications))
}

/// Admin view of every application against one franchise. Owners use
/// `/applications/received`.
#[utoipa::path(
    get,
    path = "/franchises/{id}/applications",
    params(("id" = Uuid, Path, description = "Franchise id")),
    responses(
        (status = 200, description = "Applications for one franchise", body = [Application]),
        (status = 403, description = "Caller is not an admin")
    ),
    tag = "Applications"
)]
pub async fn list_franchise_applications(
    State(state): State<AppState>,
    caller: Caller,
    Path(franchise_id): Path<Uuid>,
) -> Result<Json<Vec<Application>>, AppError> {
    caller.admin(&state).await?;

    let applications = state
        .services
        .applications
        .list_by_franchise(franchise_id)
        .await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application found", body = Application),
        (status = 403, description = "Caller is neither applicant nor franchise owner"),
        (status = 404, description = "Application not found")
    ),
    tag = "Applications"
)]
pub async fn get_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let service = &state.services.applications;
    let application = service.get_application(id).await?;

    let user = caller.user(&state).await?;
    let allowed = application.is_owned_by(user.id)
        || user.role == UserRole::Admin
        || service
            .is_application_business_owner(id, caller.identifier())
            .await;
    if !allowed {
        return Err(AppError::Forbidden(
            "You do not have access to this application".to_string(),
        ));
    }

    Ok(Json(application))
}

#[utoipa::path(
    put,
    path = "/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ApplicationPatch,
    responses(
        (status = 200, description = "Application updated", body = Application),
        (status = 403, description = "Not the applicant"),
        (status = 422, description = "Application already decided")
    ),
    tag = "Applications"
)]
pub async fn update_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Json<Application>, AppError> {
    let user_id = caller.user_id(&state).await?;
    let application = state
        .services
        .applications
        .update_application(id, patch, user_id)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/submit",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application submitted", body = Application),
        (status = 422, description = "Application incomplete or not under review")
    ),
    tag = "Applications"
)]
pub async fn submit_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let user_id = caller.user_id(&state).await?;
    let application = state
        .services
        .applications
        .submit_application(id, user_id)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/approve",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Application approved", body = Application),
        (status = 403, description = "Caller cannot review this application")
    ),
    tag = "Applications"
)]
pub async fn approve_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<ApproveRequest>,
) -> Result<Json<Application>, AppError> {
    let reviewer_id = caller.user_id(&state).await?;
    let application = state
        .services
        .applications
        .approve_application(id, body.comments, reviewer_id)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/reject",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Application rejected", body = Application),
        (status = 400, description = "Blank reason"),
        (status = 403, description = "Caller cannot review this application")
    ),
    tag = "Applications"
)]
pub async fn reject_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<Application>, AppError> {
    let reviewer_id = caller.user_id(&state).await?;
    let application = state
        .services
        .applications
        .reject_application(id, &body.reason, reviewer_id)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/review",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Application reviewed", body = Application),
        (status = 422, description = "Application is not awaiting review")
    ),
    tag = "Applications"
)]
pub async fn review_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Application>, AppError> {
    let reviewer_id = caller.user_id(&state).await?;
    let application = state
        .services
        .applications
        .review_application(id, body.status, body.notes, reviewer_id)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/withdraw",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application withdrawn", body = Application),
        (status = 403, description = "Not the applicant"),
        (status = 422, description = "Application approved or already withdrawn")
    ),
    tag = "Applications"
)]
pub async fn withdraw_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let user_id = caller.user_id(&state).await?;
    let application = state
        .services
        .applications
        .withdraw_application(id, user_id)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    get,
    path = "/applications/{id}/documents",
    params(("id" = Uuid, Path, description = "Application id")),
    responses((status = 200, description = "Documents", body = [ApplicationDocument])),
    tag = "Applications"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationDocument>>, AppError> {
    Ok(Json(state.services.applications.list_documents(id).await?))
}

#[utoipa::path(
    post,
    path = "/applications/{id}/documents",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = NewDocument,
    responses(
        (status = 201, description = "Document stored", body = ApplicationDocument),
        (status = 403, description = "Not the applicant")
    ),
    tag = "Applications"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(document): Json<NewDocument>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = caller.user_id(&state).await?;
    let document = state
        .services
        .applications
        .upload_document(id, document, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    delete,
    path = "/applications/{id}/documents/{doc_id}",
    params(
        ("id" = Uuid, Path, description = "Application id"),
        ("doc_id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 204, description = "Document removed"),
        (status = 403, description = "Not the applicant")
    ),
    tag = "Applications"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, doc_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let user_id = caller.user_id(&state).await?;
    state
        .services
        .applications
        .delete_document(id, doc_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/applications/stats",
    responses(
        (status = 200, description = "Application counts", body = ApplicationStats),
        (status = 403, description = "Caller is not an admin")
    ),
    tag = "Applications"
)]
pub async fn application_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApplicationStats>, AppError> {
    caller.admin(&state).await?;
    Ok(Json(state.services.stats.application_stats().await?))
}
