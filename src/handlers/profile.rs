//! # Farmer Self-Service Handlers

use axum::{extract::State, response::Json};

use super::types::FarmerProfileDto;
use crate::auth::FarmerAuth;
use crate::error::ApiError;
use crate::repositories::FarmerRepository;
use crate::server::AppState;

/// The caller's own profile
#[utoipa::path(
    get,
    path = "/api/v1/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own profile with farm lots and household", body = FarmerProfileDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Farmer access required", body = ApiError),
        (status = 404, description = "Farmer record no longer exists", body = ApiError)
    ),
    tag = "profile"
)]
pub async fn me(
    State(state): State<AppState>,
    auth: FarmerAuth,
) -> Result<Json<FarmerProfileDto>, ApiError> {
    let profile = FarmerRepository::new(&state.db)
        .profile(auth.farmer_id)
        .await?;
    Ok(Json(profile.into()))
}
