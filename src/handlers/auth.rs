//! # Login Handlers
//!
//! Admin login by email, farmer and organic-farmer login by registry code.
//! Every failed attempt gets the same `INVALID_CREDENTIALS` response.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    Role,
    password::{PasswordError, verify_in_background},
    token::issue_token,
};
use crate::error::{ApiError, invalid_credentials};
use crate::models::FarmerKind;
use crate::repositories::{AdminRepository, FarmerRepository};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    #[schema(example = "admin@example.org")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FarmerLoginRequest {
    #[schema(example = "RF-2025-7KQ2ZD")]
    pub registry_code: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub role: Role,
    pub subject: Uuid,
    pub expires_at: DateTime<Utc>,
}

async fn password_matches(password: String, hash: String) -> Result<bool, ApiError> {
    match verify_in_background(password, hash).await {
        Ok(matches) => Ok(matches),
        Err(PasswordError::MalformedHash(reason)) => {
            tracing::warn!(%reason, "Stored password hash could not be parsed");
            Ok(false)
        }
        Err(err) => Err(anyhow::anyhow!(err).into()),
    }
}

fn login_response(state: &AppState, subject: Uuid, role: Role) -> Result<Json<LoginResponse>, ApiError> {
    let issued = issue_token(&state.config, subject, role)?;
    tracing::info!(subject = %subject, role = %role, "Login succeeded");
    Ok(Json(LoginResponse {
        token: issued.token,
        role,
        subject,
        expires_at: issued.expires_at,
    }))
}

/// Admin login
#[utoipa::path(
    post,
    path = "/api/v1/auth/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let admin = AdminRepository::new(&state.db)
        .find_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password_matches(request.password, admin.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }

    login_response(&state, admin.id, Role::Admin)
}

async fn farmer_login_for(
    state: &AppState,
    kind: FarmerKind,
    request: FarmerLoginRequest,
) -> Result<Json<LoginResponse>, ApiError> {
    let farmer = FarmerRepository::new(&state.db)
        .find_by_registry_code(&request.registry_code)
        .await?
        .filter(|farmer| farmer.farmer_kind().ok() == Some(kind))
        .ok_or_else(invalid_credentials)?;
    let hash = farmer.password_hash.clone().ok_or_else(invalid_credentials)?;

    if !password_matches(request.password, hash).await? {
        return Err(invalid_credentials());
    }

    login_response(state, farmer.id, Role::for_kind(kind))
}

/// Regular farmer login
#[utoipa::path(
    post,
    path = "/api/v1/auth/farmer/login",
    request_body = FarmerLoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn farmer_login(
    State(state): State<AppState>,
    payload: Result<Json<FarmerLoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    farmer_login_for(&state, FarmerKind::Regular, request).await
}

/// Organic farmer login
#[utoipa::path(
    post,
    path = "/api/v1/auth/organic-farmer/login",
    request_body = FarmerLoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn organic_farmer_login(
    State(state): State<AppState>,
    payload: Result<Json<FarmerLoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    farmer_login_for(&state, FarmerKind::Organic, request).await
}
