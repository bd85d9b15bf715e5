//! # Concern Handlers
//!
//! Support tickets. Farmers open and reply to their own concerns; admins see
//! every concern and resolve or reopen them.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ConcernDto, ConcernMessageDto, ConcernThreadDto, ListQuery, parse_enum};
use crate::auth::{AdminAuth, FarmerAuth, Principal};
use crate::error::ApiError;
use crate::listing::Page;
use crate::models::ConcernStatus;
use crate::repositories::concern::{ConcernFilter, Sender};
use crate::repositories::{ConcernRepository, FarmerRepository};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenConcernRequest {
    #[schema(example = "Seedling distribution schedule")]
    pub subject: String,
    /// First message of the thread
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostMessageResponse {
    pub concern: ConcernDto,
    pub message: ConcernMessageDto,
}

fn filter_from(query: &ListQuery, farmer_id: Option<Uuid>) -> Result<ConcernFilter, ApiError> {
    Ok(ConcernFilter {
        farmer_id,
        status: parse_enum("status", query.status.as_deref())?,
        search: query.search.clone(),
        created: query.created_range()?,
    })
}

/// Open a concern
#[utoipa::path(
    post,
    path = "/api/v1/concerns",
    security(("bearer_auth" = [])),
    request_body = OpenConcernRequest,
    responses(
        (status = 201, description = "Concern opened", body = ConcernThreadDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Farmer access required", body = ApiError)
    ),
    tag = "concerns"
)]
pub async fn open_concern(
    State(state): State<AppState>,
    auth: FarmerAuth,
    payload: Result<Json<OpenConcernRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConcernThreadDto>), ApiError> {
    let Json(request) = payload?;

    // Session may outlive the farmer record.
    FarmerRepository::new(&state.db).get(auth.farmer_id).await?;

    let thread = ConcernRepository::new(&state.db)
        .open(
            auth.farmer_id,
            auth.principal.role.sender_type(),
            &request.subject,
            &request.message,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(thread.into())))
}

/// The caller's own concerns
#[utoipa::path(
    get,
    path = "/api/v1/me/concerns",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Own concerns, newest first", body = Page<ConcernDto>),
        (status = 403, description = "Farmer access required", body = ApiError)
    ),
    tag = "concerns"
)]
pub async fn my_concerns(
    State(state): State<AppState>,
    auth: FarmerAuth,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<ConcernDto>>, ApiError> {
    let Query(query) = query?;
    let filter = filter_from(&query, Some(auth.farmer_id))?;

    let concerns = ConcernRepository::new(&state.db)
        .list(&filter, query.page_request()?)
        .await?;
    Ok(Json(concerns.map(ConcernDto::from)))
}

/// All concerns (admin)
#[utoipa::path(
    get,
    path = "/api/v1/concerns",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Concerns, newest first", body = Page<ConcernDto>),
        (status = 400, description = "Invalid filters", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError)
    ),
    tag = "concerns"
)]
pub async fn list_concerns(
    State(state): State<AppState>,
    _admin: AdminAuth,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<ConcernDto>>, ApiError> {
    let Query(query) = query?;
    let filter = filter_from(&query, None)?;

    let concerns = ConcernRepository::new(&state.db)
        .list(&filter, query.page_request()?)
        .await?;
    Ok(Json(concerns.map(ConcernDto::from)))
}

fn owner_scope(principal: &Principal) -> Option<Uuid> {
    (!principal.is_admin()).then_some(principal.id)
}

/// Concern thread
#[utoipa::path(
    get,
    path = "/api/v1/concerns/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Concern id")),
    responses(
        (status = 200, description = "Concern with messages", body = ConcernThreadDto),
        (status = 404, description = "Concern not found", body = ApiError)
    ),
    tag = "concerns"
)]
pub async fn get_concern(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<ConcernThreadDto>, ApiError> {
    let thread = ConcernRepository::new(&state.db)
        .thread(id, owner_scope(&principal))
        .await?;
    Ok(Json(thread.into()))
}

/// Reply to a concern
#[utoipa::path(
    post,
    path = "/api/v1/concerns/{id}/messages",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Concern id")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = PostMessageResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Concern not found", body = ApiError)
    ),
    tag = "concerns"
)]
pub async fn post_message(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    payload: Result<Json<PostMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostMessageResponse>), ApiError> {
    let Json(request) = payload?;
    let repo = ConcernRepository::new(&state.db);

    let concern = repo.get_visible(id, owner_scope(&principal)).await?;
    let (concern, message) = repo
        .add_message(
            concern,
            Sender {
                sender_type: principal.role.sender_type(),
                sender_id: principal.id,
            },
            &request.body,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostMessageResponse {
            concern: concern.into(),
            message: message.into(),
        }),
    ))
}

async fn set_concern_status(
    state: &AppState,
    id: Uuid,
    status: ConcernStatus,
) -> Result<Json<ConcernDto>, ApiError> {
    let concern = ConcernRepository::new(&state.db)
        .set_status(id, status)
        .await?;
    tracing::info!(concern_id = %id, status = status.as_str(), "Concern status changed");
    Ok(Json(concern.into()))
}

/// Mark a concern resolved
#[utoipa::path(
    post,
    path = "/api/v1/concerns/{id}/resolve",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Concern id")),
    responses(
        (status = 200, description = "Concern resolved", body = ConcernDto),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Concern not found", body = ApiError)
    ),
    tag = "concerns"
)]
pub async fn resolve_concern(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ConcernDto>, ApiError> {
    set_concern_status(&state, id, ConcernStatus::Resolved).await
}

/// Reopen a resolved concern
#[utoipa::path(
    post,
    path = "/api/v1/concerns/{id}/reopen",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Concern id")),
    responses(
        (status = 200, description = "Concern reopened", body = ConcernDto),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Concern not found", body = ApiError)
    ),
    tag = "concerns"
)]
pub async fn reopen_concern(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ConcernDto>, ApiError> {
    set_concern_status(&state, id, ConcernStatus::Open).await
}
