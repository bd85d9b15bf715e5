//! Farmer entity model
//!
//! This module contains the SeaORM entity model for the farmers table.
//! Regular and organic farmers share the table; `kind` tells them apart and
//! `status` holds the applicant status.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use super::{ApplicantStatus, FarmerKind, UnknownVariant};

/// Farmer entity representing a registrant
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "farmers")]
pub struct Model {
    /// Unique identifier for the farmer (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable identifier encoded on the farmer's QR card
    #[sea_orm(unique)]
    pub registry_code: String,

    /// Farmer category (`regular` | `organic`)
    pub kind: String,

    /// Applicant status (`APPLICANTS` | `NOT_QUALIFIED` | `REGISTERED` | `ARCHIVED`)
    pub status: String,

    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub sex: Option<String>,
    pub birth_date: Option<Date>,

    pub email: Option<String>,

    /// Local mobile number (11 digits starting with `09`)
    pub phone: Option<String>,

    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,

    /// Inline image data URL
    pub photo: Option<String>,

    /// Certification reference, organic farmers only
    pub organic_certification: Option<String>,

    /// Reason recorded when an applicant is marked not qualified
    pub rejection_reason: Option<String>,

    /// Argon2 PHC string; farmers without one cannot log in
    pub password_hash: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed farmer kind
    pub fn farmer_kind(&self) -> Result<FarmerKind, UnknownVariant> {
        self.kind.parse()
    }

    /// Parsed applicant status
    pub fn applicant_status(&self) -> Result<ApplicantStatus, UnknownVariant> {
        self.status.parse()
    }

    /// Display name: "First Middle Last" skipping an empty middle name
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().map(str::trim) {
            Some(middle) if !middle.is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::farm_detail::Entity")]
    FarmDetail,
    #[sea_orm(has_one = "super::house_head::Entity")]
    HouseHead,
    #[sea_orm(has_many = "super::farmer_concern::Entity")]
    FarmerConcern,
}

impl Related<super::farm_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FarmDetail.def()
    }
}

impl Related<super::house_head::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HouseHead.def()
    }
}

impl Related<super::farmer_concern::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FarmerConcern.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
