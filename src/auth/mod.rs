//! # Authentication and Authorization
//!
//! Bearer-token sessions for admins and farmers. The middleware validates the
//! JWT and stores a [`Principal`] in request extensions; handlers pick the
//! extractor matching the roles they accept.

pub mod password;
pub mod token;

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, forbidden, unauthorized, unauthorized_with_trace_id};
use crate::models::{FarmerKind, SenderType};
use crate::server::AppState;
use crate::telemetry::TraceContext;

/// Session role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Farmer,
    OrganicFarmer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Farmer => "farmer",
            Role::OrganicFarmer => "organic_farmer",
        }
    }

    /// Session role for a farmer of the given kind
    pub fn for_kind(kind: FarmerKind) -> Self {
        match kind {
            FarmerKind::Regular => Role::Farmer,
            FarmerKind::Organic => Role::OrganicFarmer,
        }
    }

    pub fn sender_type(&self) -> SenderType {
        match self {
            Role::Admin => SenderType::Admin,
            Role::Farmer => SenderType::Farmer,
            Role::OrganicFarmer => SenderType::OrganicFarmer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller of any role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authenticated admin.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth(pub Principal);

/// Authenticated farmer (regular or organic).
#[derive(Debug, Clone, Copy)]
pub struct FarmerAuth {
    pub farmer_id: Uuid,
    pub kind: FarmerKind,
    pub principal: Principal,
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Authentication middleware that validates bearer session tokens
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = request
        .extensions()
        .get::<TraceContext>()
        .map(|ctx| ctx.trace_id.clone());

    let token = extract_bearer_token(request.headers()).map_err(|message| match &trace_id {
        Some(trace_id) => unauthorized_with_trace_id(Some(message), trace_id.clone()),
        None => unauthorized(Some(message)),
    })?;
    let claims = token::verify_token(&config, token)?;

    let principal = Principal {
        id: claims.sub,
        role: claims.role,
    };
    tracing::debug!(subject = %principal.id, role = %principal.role, "Authenticated request");

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header")?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or("Authorization header must use Bearer scheme")
}

impl<S> FromRequestParts<S> for Principal
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(|| unauthorized(None))
    }
}

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if principal.is_admin() {
            Ok(AdminAuth(principal))
        } else {
            Err(forbidden(Some("Admin access required")))
        }
    }
}

impl<S> FromRequestParts<S> for FarmerAuth
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        let kind = match principal.role {
            Role::Farmer => FarmerKind::Regular,
            Role::OrganicFarmer => FarmerKind::Organic,
            Role::Admin => return Err(forbidden(Some("Farmer access required"))),
        };
        Ok(FarmerAuth {
            farmer_id: principal.id,
            kind,
            principal,
        })
    }
}
