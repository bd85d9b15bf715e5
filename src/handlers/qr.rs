//! # QR Lookup
//!
//! Resolves the text scanned from a farmer's QR card. Cards encode the
//! registry code; older cards carry the record id.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::types::FarmerProfileDto;
use crate::auth::AdminAuth;
use crate::error::{ApiError, not_found, validation_error};
use crate::models::FarmerKind;
use crate::models::farmer::Model as FarmerModel;
use crate::repositories::FarmerRepository;
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QrLookupQuery {
    /// Scanned text: a registry code or a farmer id
    pub code: String,
    /// Expected farmer kind
    pub kind: FarmerKind,
}

/// Find the farmer a scanned code refers to, restricted to `kind`.
pub async fn resolve_scanned_code(
    repo: &FarmerRepository<'_>,
    code: &str,
    kind: FarmerKind,
) -> Result<Option<FarmerModel>, ApiError> {
    let code = code.trim();
    let farmer = match Uuid::parse_str(code) {
        Ok(id) => repo.find_by_id(id).await?,
        Err(_) => repo.find_by_registry_code(code).await?,
    };
    Ok(farmer.filter(|farmer| farmer.farmer_kind().ok() == Some(kind)))
}

/// Look up a farmer from a scanned QR code
#[utoipa::path(
    get,
    path = "/api/v1/qr/lookup",
    security(("bearer_auth" = [])),
    params(QrLookupQuery),
    responses(
        (status = 200, description = "Matching farmer", body = FarmerProfileDto),
        (status = 400, description = "Missing code", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "No farmer of that kind matches", body = ApiError)
    ),
    tag = "qr"
)]
pub async fn lookup(
    State(state): State<AppState>,
    _admin: AdminAuth,
    query: Result<Query<QrLookupQuery>, QueryRejection>,
) -> Result<Json<FarmerProfileDto>, ApiError> {
    let Query(query) = query?;
    if query.code.trim().is_empty() {
        return Err(validation_error(
            "Scanned code is empty",
            serde_json::json!({ "code": "is required" }),
        ));
    }

    let repo = FarmerRepository::new(&state.db);
    let farmer = resolve_scanned_code(&repo, &query.code, query.kind)
        .await?
        .ok_or_else(|| not_found("farmer"))?;

    tracing::info!(farmer_id = %farmer.id, kind = %query.kind, "QR code resolved");
    Ok(Json(repo.load_profile(farmer).await?.into()))
}
