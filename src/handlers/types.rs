//! # Common API Types
//!
//! Response DTOs shared across handlers, list query parameters, and input
//! validation for farmer contact fields.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::listing::{DateRange, PageRequest};
use crate::models::concern_message::Model as ConcernMessageModel;
use crate::models::event::Model as EventModel;
use crate::models::farm_detail::Model as FarmDetailModel;
use crate::models::farmer::Model as FarmerModel;
use crate::models::farmer_concern::Model as FarmerConcernModel;
use crate::models::house_head::Model as HouseHeadModel;
use crate::repositories::concern::ConcernThread;
use crate::repositories::farmer::FarmerProfile;
use crate::sms::is_valid_local_number;

/// Largest accepted photo after base64 decoding
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Concern list query: `status`, `search`, `from`, `to`, `page`, `limit`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// `OPEN` or `RESOLVED`
    pub status: Option<String>,
    /// Page number starting at 1
    pub page: Option<u64>,
    /// Page size (1-100, default 10)
    pub limit: Option<u64>,
    /// Case-insensitive substring search
    pub search: Option<String>,
    /// Earliest creation date (inclusive)
    pub from: Option<NaiveDate>,
    /// Latest creation date (inclusive, whole day)
    pub to: Option<NaiveDate>,
}

impl ListQuery {
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::new(self.page, self.limit)
    }

    pub fn created_range(&self) -> Result<DateRange, ApiError> {
        DateRange::from_dates(self.from, self.to)
    }
}

/// Farmer as returned by the API. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmerDto {
    pub id: Uuid,
    #[schema(example = "RF-2025-7KQ2ZD")]
    pub registry_code: String,
    #[schema(example = "regular")]
    pub kind: String,
    #[schema(example = "APPLICANTS")]
    pub status: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    #[schema(example = "09171234567")]
    pub phone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    /// Inline image data URL
    pub photo: Option<String>,
    pub organic_certification: Option<String>,
    pub rejection_reason: Option<String>,
    /// Whether the farmer can log in
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FarmerModel> for FarmerDto {
    fn from(model: FarmerModel) -> Self {
        Self {
            id: model.id,
            registry_code: model.registry_code,
            kind: model.kind,
            status: model.status,
            first_name: model.first_name,
            middle_name: model.middle_name,
            last_name: model.last_name,
            sex: model.sex,
            birth_date: model.birth_date,
            email: model.email,
            phone: model.phone,
            barangay: model.barangay,
            municipality: model.municipality,
            province: model.province,
            photo: model.photo,
            organic_certification: model.organic_certification,
            rejection_reason: model.rejection_reason,
            has_password: model.password_hash.is_some(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Farm lot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmDto {
    pub id: Uuid,
    pub location: String,
    pub area_hectares: f64,
    pub commodity: String,
    pub tenure: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FarmDetailModel> for FarmDto {
    fn from(model: FarmDetailModel) -> Self {
        Self {
            id: model.id,
            location: model.location,
            area_hectares: model.area_hectares,
            commodity: model.commodity,
            tenure: model.tenure,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Household head
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HouseholdDto {
    pub name: String,
    pub relationship: String,
    pub household_members: i32,
}

impl From<HouseHeadModel> for HouseholdDto {
    fn from(model: HouseHeadModel) -> Self {
        Self {
            name: model.name,
            relationship: model.relationship,
            household_members: model.household_members,
        }
    }
}

/// Farmer with farm lots and household head
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmerProfileDto {
    #[serde(flatten)]
    pub farmer: FarmerDto,
    pub farms: Vec<FarmDto>,
    pub household: Option<HouseholdDto>,
}

impl From<FarmerProfile> for FarmerProfileDto {
    fn from(profile: FarmerProfile) -> Self {
        Self {
            farmer: profile.farmer.into(),
            farms: profile.farms.into_iter().map(Into::into).collect(),
            household: profile.household.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConcernDto {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub subject: String,
    #[schema(example = "OPEN")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FarmerConcernModel> for ConcernDto {
    fn from(model: FarmerConcernModel) -> Self {
        Self {
            id: model.id,
            farmer_id: model.farmer_id,
            subject: model.subject,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConcernMessageDto {
    pub id: Uuid,
    #[schema(example = "FARMER")]
    pub sender_type: String,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<ConcernMessageModel> for ConcernMessageDto {
    fn from(model: ConcernMessageModel) -> Self {
        Self {
            id: model.id,
            sender_type: model.sender_type,
            sender_id: model.sender_id,
            body: model.body,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Concern with its messages oldest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConcernThreadDto {
    #[serde(flatten)]
    pub concern: ConcernDto,
    pub messages: Vec<ConcernMessageDto>,
}

impl From<ConcernThread> for ConcernThreadDto {
    fn from(thread: ConcernThread) -> Self {
        Self {
            concern: thread.concern.into(),
            messages: thread.messages.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventModel> for EventDto {
    fn from(model: EventModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            location: model.location,
            starts_at: model.starts_at.with_timezone(&Utc),
            ends_at: model.ends_at.map(|e| e.with_timezone(&Utc)),
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Collects per-field validation failures into one `VALIDATION_FAILED` error.
#[derive(Debug, Default)]
pub struct FieldErrors(Map<String, Value>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), Value::String(message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(validation_error("Validation failed", Value::Object(self.0)))
        }
    }

    /// Check phone, email and photo when they carry a non-empty value.
    pub fn check_contact(&mut self, email: Option<&str>, phone: Option<&str>, photo: Option<&str>) {
        if let Some(phone) = non_blank(phone)
            && !is_valid_local_number(phone)
        {
            self.add("phone", "must be 11 digits starting with 09");
        }
        if let Some(email) = non_blank(email)
            && !is_plausible_email(email)
        {
            self.add("email", "must be a valid email address");
        }
        if let Some(photo) = non_blank(photo)
            && let Err(message) = validate_photo(photo)
        {
            self.add("photo", message);
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !email.contains(' '),
        None => false,
    }
}

/// Accept `data:image/<type>;base64,<payload>` with at most [`MAX_PHOTO_BYTES`] decoded.
pub fn validate_photo(photo: &str) -> Result<(), &'static str> {
    let rest = photo
        .strip_prefix("data:")
        .ok_or("must be a base64 image data URL")?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or("must be a base64 image data URL")?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or("must be a base64 image data URL")?;
    if !mime.starts_with("image/") || mime.len() == "image/".len() {
        return Err("must be an image");
    }

    // Reject oversized payloads before decoding them.
    if payload.len() / 4 * 3 > MAX_PHOTO_BYTES + 3 {
        return Err("must not exceed 2 MiB");
    }
    let decoded = STANDARD
        .decode(payload.trim())
        .map_err(|_| "contains invalid base64")?;
    if decoded.len() > MAX_PHOTO_BYTES {
        return Err("must not exceed 2 MiB");
    }
    Ok(())
}

/// Parse an enum query value, reporting the field on failure.
pub fn parse_enum<T: std::str::FromStr>(field: &str, value: Option<&str>) -> Result<Option<T>, ApiError> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            validation_error(
                "Invalid query parameter",
                json!({ field: format!("unsupported value '{raw}'") }),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicantStatus;

    fn data_url(bytes: usize) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(vec![7u8; bytes]))
    }

    #[test]
    fn photo_must_be_an_image_data_url() {
        assert!(validate_photo(&data_url(16)).is_ok());
        assert!(validate_photo("https://example.com/a.png").is_err());
        assert!(validate_photo("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(validate_photo("data:image/png,raw").is_err());
        assert!(validate_photo("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn photo_size_limit_is_on_decoded_bytes() {
        assert!(validate_photo(&data_url(MAX_PHOTO_BYTES)).is_ok());
        assert_eq!(
            validate_photo(&data_url(MAX_PHOTO_BYTES + 1)),
            Err("must not exceed 2 MiB")
        );
    }

    #[test]
    fn contact_checks_collect_every_field() {
        let mut errors = FieldErrors::default();
        errors.check_contact(Some("not-an-email"), Some("12345"), Some("nope"));
        let err = errors.into_result().unwrap_err();
        let details = err.details.unwrap();
        assert!(details.get("email").is_some());
        assert!(details.get("phone").is_some());
        assert!(details.get("photo").is_some());
    }

    #[test]
    fn blank_contact_fields_are_ignored() {
        let mut errors = FieldErrors::default();
        errors.check_contact(Some(""), Some("  "), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn enum_query_values() {
        assert_eq!(
            parse_enum::<ApplicantStatus>("status", Some("registered")).unwrap(),
            Some(ApplicantStatus::Registered)
        );
        assert_eq!(parse_enum::<ApplicantStatus>("status", Some(" ")).unwrap(), None);
        assert!(parse_enum::<ApplicantStatus>("status", Some("PENDING")).is_err());
    }
}
