//! # Farmer Handlers
//!
//! Public registration plus the admin worklist: listing, profile edits, farm
//! lots, household head and applicant status changes.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header::LOCATION},
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{FarmDto, FarmerDto, FarmerProfileDto, FieldErrors, HouseholdDto, parse_enum};
use crate::auth::AdminAuth;
use crate::auth::password::{MIN_PASSWORD_LENGTH, hash_in_background};
use crate::error::ApiError;
use crate::listing::{DateRange, Page, PageRequest};
use crate::models::{ApplicantStatus, FarmerKind};
use crate::repositories::FarmerRepository;
use crate::repositories::farmer::{
    FarmerFields, FarmerFilter, FarmerUpdate, HouseholdInput, NewFarmDetail, NewFarmer,
};
use crate::server::AppState;
use crate::status_workflow::{NotificationOutcome, StatusWorkflow};

/// Farm lot in a request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmInput {
    #[schema(example = "Sitio Malinis, Brgy. San Jose")]
    pub location: String,
    #[schema(example = 1.5)]
    pub area_hectares: f64,
    #[schema(example = "Rice")]
    pub commodity: String,
    /// Owner, tenant, lessee...
    pub tenure: Option<String>,
}

impl From<FarmInput> for NewFarmDetail {
    fn from(input: FarmInput) -> Self {
        Self {
            location: input.location,
            area_hectares: input.area_hectares,
            commodity: input.commodity,
            tenure: input.tenure,
        }
    }
}

impl From<HouseholdDto> for HouseholdInput {
    fn from(dto: HouseholdDto) -> Self {
        Self {
            name: dto.name,
            relationship: dto.relationship,
            household_members: dto.household_members,
        }
    }
}

/// Registration form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationRequest {
    pub kind: FarmerKind,
    #[schema(example = "Ana")]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[schema(example = "Reyes")]
    pub last_name: String,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    #[schema(example = "09171234567")]
    pub phone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    /// `data:image/...;base64,` URL, at most 2 MiB decoded
    pub photo: Option<String>,
    /// Organic farmers only
    pub organic_certification: Option<String>,
    /// Enables farmer login when set
    pub password: Option<String>,
    #[serde(default)]
    pub farms: Vec<FarmInput>,
    pub household: Option<HouseholdDto>,
}

/// Partial profile edit; an empty string clears an optional field
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateFarmerRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    pub photo: Option<String>,
    pub organic_certification: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    /// `REGISTERED`, `NOT_QUALIFIED` or `ARCHIVED`
    pub status: ApplicantStatus,
    /// Stored for `NOT_QUALIFIED`, ignored otherwise
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationReport {
    pub email: NotificationOutcome,
    pub sms: NotificationOutcome,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChangeResponse {
    pub farmer: FarmerDto,
    pub notifications: NotificationReport,
}

/// Worklist filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FarmerListQuery {
    /// `regular` or `organic`
    pub kind: Option<String>,
    /// `APPLICANTS`, `NOT_QUALIFIED`, `REGISTERED` or `ARCHIVED`
    pub status: Option<String>,
    /// Matches names, registry code, email, phone, municipality and barangay
    pub search: Option<String>,
    /// Earliest registration date (inclusive)
    pub from: Option<NaiveDate>,
    /// Latest registration date (inclusive)
    pub to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

fn check_names(errors: &mut FieldErrors, first: Option<&str>, last: Option<&str>) {
    if first.is_some_and(|v| v.trim().is_empty()) {
        errors.add("first_name", "is required");
    }
    if last.is_some_and(|v| v.trim().is_empty()) {
        errors.add("last_name", "is required");
    }
}

/// Register a new farmer applicant
#[utoipa::path(
    post,
    path = "/api/v1/registrations",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Applicant registered", body = FarmerProfileDto, headers(
            ("Location", description = "URL of the farmer record")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Registry code collision", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<FarmerProfileDto>), ApiError> {
    let Json(request) = payload?;

    let mut errors = FieldErrors::default();
    check_names(
        &mut errors,
        Some(&request.first_name),
        Some(&request.last_name),
    );
    errors.check_contact(
        request.email.as_deref(),
        request.phone.as_deref(),
        request.photo.as_deref(),
    );
    if let Some(password) = &request.password
        && password.chars().count() < MIN_PASSWORD_LENGTH
    {
        errors.add(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }
    errors.into_result()?;

    let password_hash = match request.password {
        Some(password) => Some(
            hash_in_background(password)
                .await
                .map_err(|e| anyhow::anyhow!(e))?,
        ),
        None => None,
    };

    let profile = FarmerRepository::new(&state.db)
        .register(NewFarmer {
            kind: request.kind,
            fields: FarmerFields {
                first_name: request.first_name,
                middle_name: request.middle_name,
                last_name: request.last_name,
                sex: request.sex,
                birth_date: request.birth_date,
                email: request.email,
                phone: request.phone,
                barangay: request.barangay,
                municipality: request.municipality,
                province: request.province,
                photo: request.photo,
                organic_certification: request.organic_certification,
            },
            password_hash,
            farms: request.farms.into_iter().map(Into::into).collect(),
            household: request.household.map(Into::into),
        })
        .await?;

    let location = format!("/api/v1/farmers/{}", profile.farmer.id);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(profile.into()),
    ))
}

/// List farmers for the admin worklist
#[utoipa::path(
    get,
    path = "/api/v1/farmers",
    security(("bearer_auth" = [])),
    params(FarmerListQuery),
    responses(
        (status = 200, description = "Page of farmers, newest first", body = Page<FarmerDto>),
        (status = 400, description = "Invalid filters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn list_farmers(
    State(state): State<AppState>,
    _admin: AdminAuth,
    query: Result<Query<FarmerListQuery>, QueryRejection>,
) -> Result<Json<Page<FarmerDto>>, ApiError> {
    let Query(query) = query?;

    let filter = FarmerFilter {
        kind: parse_enum("kind", query.kind.as_deref())?,
        status: parse_enum("status", query.status.as_deref())?,
        search: query.search,
        created: DateRange::from_dates(query.from, query.to)?,
    };
    let page = PageRequest::new(query.page, query.limit)?;

    let farmers = FarmerRepository::new(&state.db).list(&filter, page).await?;
    Ok(Json(farmers.map(FarmerDto::from)))
}

/// Farmer profile with farm lots and household head
#[utoipa::path(
    get,
    path = "/api/v1/farmers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Farmer id")),
    responses(
        (status = 200, description = "Farmer profile", body = FarmerProfileDto),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Farmer not found", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn get_farmer(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<FarmerProfileDto>, ApiError> {
    let profile = FarmerRepository::new(&state.db).profile(id).await?;
    Ok(Json(profile.into()))
}

/// Edit personal and contact fields
#[utoipa::path(
    patch,
    path = "/api/v1/farmers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Farmer id")),
    request_body = UpdateFarmerRequest,
    responses(
        (status = 200, description = "Updated farmer", body = FarmerDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Farmer not found", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn update_farmer(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateFarmerRequest>, JsonRejection>,
) -> Result<Json<FarmerDto>, ApiError> {
    let Json(request) = payload?;

    let mut errors = FieldErrors::default();
    check_names(
        &mut errors,
        request.first_name.as_deref(),
        request.last_name.as_deref(),
    );
    errors.check_contact(
        request.email.as_deref(),
        request.phone.as_deref(),
        request.photo.as_deref(),
    );
    errors.into_result()?;

    let farmer = FarmerRepository::new(&state.db)
        .update(
            id,
            FarmerUpdate {
                first_name: request.first_name,
                middle_name: request.middle_name,
                last_name: request.last_name,
                sex: request.sex,
                birth_date: request.birth_date,
                email: request.email,
                phone: request.phone,
                barangay: request.barangay,
                municipality: request.municipality,
                province: request.province,
                photo: request.photo,
                organic_certification: request.organic_certification,
            },
        )
        .await?;

    Ok(Json(farmer.into()))
}

/// Change applicant status and notify the farmer
#[utoipa::path(
    post,
    path = "/api/v1/farmers/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Farmer id")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status updated; notification outcomes included", body = StatusChangeResponse),
        (status = 400, description = "Invalid target status", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Farmer not found", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn change_status(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(id): Path<Uuid>,
    payload: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::debug!(admin_id = %admin.id, farmer_id = %id, status = %request.status, "Status change requested");

    let report = StatusWorkflow::new(&state.db, &*state.mailer, &*state.sms)
        .transition(id, request.status, request.reason)
        .await?;

    Ok(Json(StatusChangeResponse {
        farmer: report.farmer.into(),
        notifications: NotificationReport {
            email: report.email,
            sms: report.sms,
        },
    }))
}

/// Add a farm lot
#[utoipa::path(
    post,
    path = "/api/v1/farmers/{id}/farms",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Farmer id")),
    request_body = FarmInput,
    responses(
        (status = 201, description = "Farm lot added", body = FarmDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Farmer not found", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn add_farm(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    payload: Result<Json<FarmInput>, JsonRejection>,
) -> Result<(StatusCode, Json<FarmDto>), ApiError> {
    let Json(request) = payload?;
    let farm = FarmerRepository::new(&state.db)
        .add_farm(id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(farm.into())))
}

/// Remove a farm lot
#[utoipa::path(
    delete,
    path = "/api/v1/farmers/{id}/farms/{farm_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Farmer id"),
        ("farm_id" = Uuid, Path, description = "Farm lot id")
    ),
    responses(
        (status = 204, description = "Farm lot removed"),
        (status = 404, description = "Farm lot not found", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn delete_farm(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path((id, farm_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    FarmerRepository::new(&state.db)
        .delete_farm(id, farm_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create or replace the household head
#[utoipa::path(
    put,
    path = "/api/v1/farmers/{id}/household",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Farmer id")),
    request_body = HouseholdDto,
    responses(
        (status = 200, description = "Household head saved", body = HouseholdDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Farmer not found", body = ApiError)
    ),
    tag = "farmers"
)]
pub async fn upsert_household(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    payload: Result<Json<HouseholdDto>, JsonRejection>,
) -> Result<Json<HouseholdDto>, ApiError> {
    let Json(request) = payload?;
    let household = FarmerRepository::new(&state.db)
        .upsert_household(id, request.into())
        .await?;
    Ok(Json(household.into()))
}
