//! # Data Models
//!
//! SeaORM entities for the farmer registry plus the enums stored in their
//! text columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod admin;
pub mod concern_message;
pub mod event;
pub mod farm_detail;
pub mod farmer;
pub mod farmer_concern;
pub mod house_head;

pub use admin::Entity as Admin;
pub use concern_message::Entity as ConcernMessage;
pub use event::Entity as Event;
pub use farm_detail::Entity as FarmDetail;
pub use farmer::Entity as Farmer;
pub use farmer_concern::Entity as FarmerConcern;
pub use house_head::Entity as HouseHead;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "farmer-registry".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error returned when a stored or submitted enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Applicant status gating a farmer's visibility in admin worklists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicantStatus {
    Applicants,
    NotQualified,
    Registered,
    Archived,
}

impl ApplicantStatus {
    pub const ALL: [ApplicantStatus; 4] = [
        ApplicantStatus::Applicants,
        ApplicantStatus::NotQualified,
        ApplicantStatus::Registered,
        ApplicantStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStatus::Applicants => "APPLICANTS",
            ApplicantStatus::NotQualified => "NOT_QUALIFIED",
            ApplicantStatus::Registered => "REGISTERED",
            ApplicantStatus::Archived => "ARCHIVED",
        }
    }

    /// Whether an admin may move a farmer into this status.
    pub fn is_transition_target(&self) -> bool {
        !matches!(self, ApplicantStatus::Applicants)
    }

    /// Human-readable label used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            ApplicantStatus::Applicants => "under review",
            ApplicantStatus::NotQualified => "not qualified",
            ApplicantStatus::Registered => "registered",
            ApplicantStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicantStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ApplicantStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "applicant status",
                value: value.to_string(),
            })
    }
}

/// Farmer category. Both kinds live in the `farmers` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FarmerKind {
    Regular,
    Organic,
}

impl FarmerKind {
    pub const ALL: [FarmerKind; 2] = [FarmerKind::Regular, FarmerKind::Organic];

    pub fn as_str(&self) -> &'static str {
        match self {
            FarmerKind::Regular => "regular",
            FarmerKind::Organic => "organic",
        }
    }

    /// Prefix of registry codes issued to this kind of farmer.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            FarmerKind::Regular => "RF",
            FarmerKind::Organic => "OF",
        }
    }
}

impl fmt::Display for FarmerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FarmerKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(FarmerKind::Regular),
            "organic" => Ok(FarmerKind::Organic),
            _ => Err(UnknownVariant {
                kind: "farmer kind",
                value: value.to_string(),
            }),
        }
    }
}

/// Lifecycle of a support concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConcernStatus {
    Open,
    Resolved,
}

impl ConcernStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcernStatus::Open => "OPEN",
            ConcernStatus::Resolved => "RESOLVED",
        }
    }
}

impl FromStr for ConcernStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(ConcernStatus::Open),
            "RESOLVED" => Ok(ConcernStatus::Resolved),
            _ => Err(UnknownVariant {
                kind: "concern status",
                value: value.to_string(),
            }),
        }
    }
}

/// Who wrote a concern message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderType {
    Admin,
    Farmer,
    OrganicFarmer,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Admin => "ADMIN",
            SenderType::Farmer => "FARMER",
            SenderType::OrganicFarmer => "ORGANIC_FARMER",
        }
    }
}

impl FromStr for SenderType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(SenderType::Admin),
            "FARMER" => Ok(SenderType::Farmer),
            "ORGANIC_FARMER" => Ok(SenderType::OrganicFarmer),
            _ => Err(UnknownVariant {
                kind: "sender type",
                value: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applicant_status_round_trips_through_column_text() {
        for status in ApplicantStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicantStatus>().unwrap(), status);
        }
        assert_eq!(
            "not_qualified".parse::<ApplicantStatus>().unwrap(),
            ApplicantStatus::NotQualified
        );
        assert!("PENDING".parse::<ApplicantStatus>().is_err());
    }

    #[test]
    fn applicants_is_not_a_transition_target() {
        assert!(!ApplicantStatus::Applicants.is_transition_target());
        assert!(ApplicantStatus::Registered.is_transition_target());
        assert!(ApplicantStatus::NotQualified.is_transition_target());
        assert!(ApplicantStatus::Archived.is_transition_target());
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ApplicantStatus::NotQualified).unwrap();
        assert_eq!(json, "\"NOT_QUALIFIED\"");
    }

    #[test]
    fn farmer_kind_parses_case_insensitively() {
        assert_eq!(" Organic ".parse::<FarmerKind>().unwrap(), FarmerKind::Organic);
        assert_eq!(FarmerKind::Regular.code_prefix(), "RF");
        assert!("hybrid".parse::<FarmerKind>().is_err());
    }
}
