//! # Event Handlers
//!
//! Agricultural events (trainings, distributions, meetings). Everyone signed
//! in can read them; only admins manage them.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::EventDto;
use crate::auth::{AdminAuth, Principal};
use crate::calendar::{Month, bucket_by_day, days_in_month};
use crate::error::ApiError;
use crate::listing::DateRange;
use crate::repositories::EventRepository;
use crate::repositories::event::{EventUpdate, NewEvent};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// First day of the window (inclusive)
    pub from: Option<NaiveDate>,
    /// Last day of the window (inclusive)
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    #[param(example = 2025)]
    pub year: i32,
    /// 1-12
    #[param(example = 3)]
    pub month: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    #[schema(example = "Rice farming seminar")]
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    /// Empty string clears
    pub description: Option<String>,
    /// Empty string clears
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    /// End time (absent = no change, null = open-ended, value = set)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<EventDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Days that have at least one event, in date order
    pub days: Vec<CalendarDay>,
}

/// Events overlapping a date window
#[utoipa::path(
    get,
    path = "/api/v1/events",
    security(("bearer_auth" = [])),
    params(EventListQuery),
    responses(
        (status = 200, description = "Events ordered by start", body = Vec<EventDto>),
        (status = 400, description = "Invalid date window", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    _principal: Principal,
    query: Result<Query<EventListQuery>, QueryRejection>,
) -> Result<Json<Vec<EventDto>>, ApiError> {
    let Query(query) = query?;
    let range = DateRange::from_dates(query.from, query.to)?;

    let events = EventRepository::new(&state.db)
        .list_overlapping(&range)
        .await?;
    Ok(Json(events.into_iter().map(EventDto::from).collect()))
}

/// Month view grouped by day
#[utoipa::path(
    get,
    path = "/api/v1/events/calendar",
    security(("bearer_auth" = [])),
    params(CalendarQuery),
    responses(
        (status = 200, description = "Events bucketed per day", body = CalendarResponse),
        (status = 400, description = "Invalid month", body = ApiError)
    ),
    tag = "events"
)]
pub async fn calendar(
    State(state): State<AppState>,
    _principal: Principal,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> Result<Json<CalendarResponse>, ApiError> {
    let Query(query) = query?;
    let month = Month::new(query.year, query.month)?;

    let events = EventRepository::new(&state.db)
        .list_overlapping(&month.date_range()?)
        .await?;

    let days = bucket_by_day(month, &events)
        .into_iter()
        .map(|bucket| CalendarDay {
            date: bucket.date,
            events: bucket.events.into_iter().map(EventDto::from).collect(),
        })
        .collect();

    Ok(Json(CalendarResponse {
        year: query.year,
        month: query.month,
        days_in_month: days_in_month(month),
        days,
    }))
}

/// Create an event
#[utoipa::path(
    post,
    path = "/api/v1/events",
    security(("bearer_auth" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError)
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventDto>), ApiError> {
    let Json(request) = payload?;

    let event = EventRepository::new(&state.db)
        .create(
            NewEvent {
                title: request.title,
                description: request.description,
                location: request.location,
                starts_at: request.starts_at,
                ends_at: request.ends_at,
            },
            Some(admin.id),
        )
        .await?;

    tracing::info!(event_id = %event.id, "Event created");
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// Edit an event
#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Event not found", body = ApiError)
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<EventDto>, ApiError> {
    let Json(request) = payload?;

    let event = EventRepository::new(&state.db)
        .update(
            id,
            EventUpdate {
                title: request.title,
                description: request.description,
                location: request.location,
                starts_at: request.starts_at,
                ends_at: request.ends_at,
            },
        )
        .await?;
    Ok(Json(event.into()))
}

/// Delete an event
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ApiError)
    ),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    EventRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
