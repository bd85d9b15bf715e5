//! # Farmer Repository
//!
//! Persistence for farmers and their sub-records (farm lots, household head):
//! registration, admin worklist queries, profile edits and status changes.

use chrono::{Datelike, NaiveDate, Utc};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::listing::{DateRange, Page, PageRequest, paginate, search_condition};
use crate::models::farm_detail::{self, ActiveModel as FarmDetailActiveModel};
use crate::models::farmer::{self, ActiveModel as FarmerActiveModel, Model as FarmerModel};
use crate::models::house_head::{self, ActiveModel as HouseHeadActiveModel};
use crate::models::{ApplicantStatus, FarmDetail, Farmer, FarmerKind, HouseHead};

const REGISTRY_CODE_SUFFIX_LEN: usize = 6;
const REGISTRY_CODE_ATTEMPTS: usize = 5;

/// Columns covered by the worklist search box
const SEARCH_COLUMNS: [farmer::Column; 8] = [
    farmer::Column::FirstName,
    farmer::Column::MiddleName,
    farmer::Column::LastName,
    farmer::Column::RegistryCode,
    farmer::Column::Email,
    farmer::Column::Phone,
    farmer::Column::Municipality,
    farmer::Column::Barangay,
];

/// Personal and contact fields shared by registration and admin edits
#[derive(Debug, Clone, Default)]
pub struct FarmerFields {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
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

/// A farm lot to record
#[derive(Debug, Clone)]
pub struct NewFarmDetail {
    pub location: String,
    pub area_hectares: f64,
    pub commodity: String,
    pub tenure: Option<String>,
}

/// Household head details
#[derive(Debug, Clone)]
pub struct HouseholdInput {
    pub name: String,
    pub relationship: String,
    pub household_members: i32,
}

/// Registration payload after request validation
#[derive(Debug, Clone)]
pub struct NewFarmer {
    pub kind: FarmerKind,
    pub fields: FarmerFields,
    pub password_hash: Option<String>,
    pub farms: Vec<NewFarmDetail>,
    pub household: Option<HouseholdInput>,
}

/// Partial update; `None` leaves a field unchanged and `Some("")` clears an optional one.
#[derive(Debug, Clone, Default)]
pub struct FarmerUpdate {
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

/// Worklist filters
#[derive(Debug, Clone, Default)]
pub struct FarmerFilter {
    pub kind: Option<FarmerKind>,
    pub status: Option<ApplicantStatus>,
    pub search: Option<String>,
    pub created: DateRange,
}

/// Farmer with farm lots and household head
#[derive(Debug, Clone)]
pub struct FarmerProfile {
    pub farmer: FarmerModel,
    pub farms: Vec<farm_detail::Model>,
    pub household: Option<house_head::Model>,
}

/// Generate a registry code such as `RF-2025-7KQ2ZD`.
pub fn generate_registry_code(kind: FarmerKind, year: i32) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REGISTRY_CODE_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}-{}-{}", kind.code_prefix(), year, suffix)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Repository for Farmer database operations
pub struct FarmerRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FarmerRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new applicant with its sub-records in one transaction.
    pub async fn register(&self, request: NewFarmer) -> Result<FarmerProfile, RepositoryError> {
        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;

        let registry_code = Self::unused_registry_code(&txn, request.kind).await?;
        let now = Utc::now();
        let fields = request.fields;
        let farmer_id = Uuid::new_v4();

        let organic_certification = match request.kind {
            FarmerKind::Organic => optional(fields.organic_certification),
            FarmerKind::Regular => None,
        };

        let farmer = FarmerActiveModel {
            id: Set(farmer_id),
            registry_code: Set(registry_code),
            kind: Set(request.kind.as_str().to_string()),
            status: Set(ApplicantStatus::Applicants.as_str().to_string()),
            first_name: Set(fields.first_name.trim().to_string()),
            middle_name: Set(optional(fields.middle_name)),
            last_name: Set(fields.last_name.trim().to_string()),
            sex: Set(optional(fields.sex)),
            birth_date: Set(fields.birth_date),
            email: Set(optional(fields.email)),
            phone: Set(optional(fields.phone)),
            barangay: Set(optional(fields.barangay)),
            municipality: Set(optional(fields.municipality)),
            province: Set(optional(fields.province)),
            photo: Set(optional(fields.photo)),
            organic_certification: Set(organic_certification),
            rejection_reason: Set(None),
            password_hash: Set(request.password_hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(RepositoryError::database_error)?;

        let mut farms = Vec::with_capacity(request.farms.len());
        for farm in request.farms {
            farms.push(Self::insert_farm(&txn, farmer_id, farm).await?);
        }

        let household = match request.household {
            Some(input) => Some(
                HouseHeadActiveModel {
                    id: Set(Uuid::new_v4()),
                    farmer_id: Set(farmer_id),
                    name: Set(input.name.trim().to_string()),
                    relationship: Set(input.relationship.trim().to_string()),
                    household_members: Set(input.household_members),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                }
                .insert(&txn)
                .await
                .map_err(RepositoryError::database_error)?,
            ),
            None => None,
        };

        txn.commit().await.map_err(RepositoryError::database_error)?;

        tracing::info!(
            farmer_id = %farmer.id,
            registry_code = %farmer.registry_code,
            kind = %farmer.kind,
            "Registered farmer applicant"
        );

        Ok(FarmerProfile {
            farmer,
            farms,
            household,
        })
    }

    async fn unused_registry_code(
        txn: &DatabaseTransaction,
        kind: FarmerKind,
    ) -> Result<String, RepositoryError> {
        let year = Utc::now().year();
        for _ in 0..REGISTRY_CODE_ATTEMPTS {
            let candidate = generate_registry_code(kind, year);
            let taken = Farmer::find()
                .filter(farmer::Column::RegistryCode.eq(candidate.as_str()))
                .one(txn)
                .await
                .map_err(RepositoryError::database_error)?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(RepositoryError::conflict(
            "Could not allocate a unique registry code",
        ))
    }

    async fn insert_farm<C: sea_orm::ConnectionTrait>(
        conn: &C,
        farmer_id: Uuid,
        farm: NewFarmDetail,
    ) -> Result<farm_detail::Model, RepositoryError> {
        if farm.location.trim().is_empty() || farm.commodity.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Farm location and commodity are required",
            ));
        }
        if !farm.area_hectares.is_finite() || farm.area_hectares <= 0.0 {
            return Err(RepositoryError::validation_error(
                "Farm area must be a positive number of hectares",
            ));
        }

        FarmDetailActiveModel {
            id: Set(Uuid::new_v4()),
            farmer_id: Set(farmer_id),
            location: Set(farm.location.trim().to_string()),
            area_hectares: Set(farm.area_hectares),
            commodity: Set(farm.commodity.trim().to_string()),
            tenure: Set(optional(farm.tenure)),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FarmerModel>, RepositoryError> {
        Farmer::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Fetch a farmer or fail with `FARMER_NOT_FOUND`
    pub async fn get(&self, id: Uuid) -> Result<FarmerModel, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("farmer"))
    }

    /// Registry code lookup, ignoring case and surrounding whitespace
    pub async fn find_by_registry_code(
        &self,
        code: &str,
    ) -> Result<Option<FarmerModel>, RepositoryError> {
        Farmer::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(farmer::Column::RegistryCode)))
                    .eq(code.trim().to_lowercase()),
            )
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Filtered, newest-first page of farmers
    pub async fn list(
        &self,
        filter: &FarmerFilter,
        page: PageRequest,
    ) -> Result<Page<FarmerModel>, RepositoryError> {
        let mut condition = Condition::all().add(filter.created.condition(farmer::Column::CreatedAt));
        if let Some(kind) = filter.kind {
            condition = condition.add(farmer::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = filter.status {
            condition = condition.add(farmer::Column::Status.eq(status.as_str()));
        }
        if let Some(search) = search_condition(filter.search.as_deref(), &SEARCH_COLUMNS) {
            condition = condition.add(search);
        }

        let select = Farmer::find()
            .filter(condition)
            .order_by_desc(farmer::Column::CreatedAt)
            .order_by_asc(farmer::Column::RegistryCode);

        paginate(self.db, select, page)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Farmer with farm lots (oldest first) and household head
    pub async fn profile(&self, id: Uuid) -> Result<FarmerProfile, RepositoryError> {
        let farmer = self.get(id).await?;
        self.load_profile(farmer).await
    }

    pub async fn load_profile(&self, farmer: FarmerModel) -> Result<FarmerProfile, RepositoryError> {
        let farms = farmer
            .find_related(FarmDetail)
            .order_by_asc(farm_detail::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let household = farmer
            .find_related(HouseHead)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(FarmerProfile {
            farmer,
            farms,
            household,
        })
    }

    /// Apply a partial update of personal/contact fields
    pub async fn update(
        &self,
        id: Uuid,
        update: FarmerUpdate,
    ) -> Result<FarmerModel, RepositoryError> {
        let farmer = self.get(id).await?;
        let is_organic = farmer.farmer_kind().ok() == Some(FarmerKind::Organic);
        let mut active = farmer.into_active_model();

        if let Some(first_name) = update.first_name {
            if first_name.trim().is_empty() {
                return Err(RepositoryError::validation_error("First name cannot be empty"));
            }
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = update.last_name {
            if last_name.trim().is_empty() {
                return Err(RepositoryError::validation_error("Last name cannot be empty"));
            }
            active.last_name = Set(last_name.trim().to_string());
        }
        if let Some(birth_date) = update.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(value) = update.organic_certification {
            if !is_organic {
                return Err(RepositoryError::validation_error(
                    "Only organic farmers carry a certification",
                ));
            }
            active.organic_certification = Set(optional(Some(value)));
        }

        macro_rules! set_optional {
            ($($field:ident),+) => {
                $(if let Some(value) = update.$field {
                    active.$field = Set(optional(Some(value)));
                })+
            };
        }
        set_optional!(middle_name, sex, email, phone, barangay, municipality, province, photo);

        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Write a status change; the reason is kept only for `NOT_QUALIFIED`.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: ApplicantStatus,
        reason: Option<String>,
    ) -> Result<FarmerModel, RepositoryError> {
        let farmer = self.get(id).await?;
        let mut active = farmer.into_active_model();

        active.status = Set(status.as_str().to_string());
        active.rejection_reason = Set(match status {
            ApplicantStatus::NotQualified => optional(reason),
            _ => None,
        });
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn add_farm(
        &self,
        farmer_id: Uuid,
        farm: NewFarmDetail,
    ) -> Result<farm_detail::Model, RepositoryError> {
        self.get(farmer_id).await?;
        Self::insert_farm(self.db, farmer_id, farm).await
    }

    /// Delete a farm lot that belongs to `farmer_id`
    pub async fn delete_farm(&self, farmer_id: Uuid, farm_id: Uuid) -> Result<(), RepositoryError> {
        let farm = FarmDetail::find_by_id(farm_id)
            .filter(farm_detail::Column::FarmerId.eq(farmer_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("farm_detail"))?;

        farm.delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    /// Create or replace the household head
    pub async fn upsert_household(
        &self,
        farmer_id: Uuid,
        input: HouseholdInput,
    ) -> Result<house_head::Model, RepositoryError> {
        if input.name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Household head name cannot be empty",
            ));
        }
        if input.household_members < 1 {
            return Err(RepositoryError::validation_error(
                "Household must have at least one member",
            ));
        }

        let farmer = self.get(farmer_id).await?;
        let existing = farmer
            .find_related(HouseHead)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let now = Utc::now();

        let result = match existing {
            Some(head) => {
                let mut active = head.into_active_model();
                active.name = Set(input.name.trim().to_string());
                active.relationship = Set(input.relationship.trim().to_string());
                active.household_members = Set(input.household_members);
                active.updated_at = Set(now.into());
                active.update(self.db).await
            }
            None => {
                HouseHeadActiveModel {
                    id: Set(Uuid::new_v4()),
                    farmer_id: Set(farmer_id),
                    name: Set(input.name.trim().to_string()),
                    relationship: Set(input.relationship.trim().to_string()),
                    household_members: Set(input.household_members),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                }
                .insert(self.db)
                .await
            }
        };

        result.map_err(RepositoryError::database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    fn new_farmer(kind: FarmerKind, first: &str, last: &str) -> NewFarmer {
        NewFarmer {
            kind,
            fields: FarmerFields {
                first_name: first.to_string(),
                last_name: last.to_string(),
                phone: Some("09171234567".to_string()),
                municipality: Some("Tanauan".to_string()),
                organic_certification: Some("PGS-001".to_string()),
                ..Default::default()
            },
            password_hash: None,
            farms: vec![NewFarmDetail {
                location: "Sitio Uno".to_string(),
                area_hectares: 1.5,
                commodity: "Rice".to_string(),
                tenure: Some("Owner".to_string()),
            }],
            household: Some(HouseholdInput {
                name: "Pedro".to_string(),
                relationship: "Father".to_string(),
                household_members: 5,
            }),
        }
    }

    #[test]
    fn registry_code_format() {
        let code = generate_registry_code(FarmerKind::Organic, 2025);
        assert!(code.starts_with("OF-2025-"));
        let suffix = &code["OF-2025-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn register_creates_applicant_with_sub_records() {
        let db = test_db().await;
        let repo = FarmerRepository::new(&db);

        let profile = repo
            .register(new_farmer(FarmerKind::Regular, "Juan", "Dela Cruz"))
            .await
            .unwrap();

        assert_eq!(profile.farmer.status, "APPLICANTS");
        assert!(profile.farmer.registry_code.starts_with("RF-"));
        // certification only applies to organic farmers
        assert_eq!(profile.farmer.organic_certification, None);
        assert_eq!(profile.farms.len(), 1);
        assert_eq!(profile.household.as_ref().map(|h| h.household_members), Some(5));

        let reloaded = repo.profile(profile.farmer.id).await.unwrap();
        assert_eq!(reloaded.farms.len(), 1);
        assert!(reloaded.household.is_some());
    }

    #[tokio::test]
    async fn registry_code_lookup_ignores_case() {
        let db = test_db().await;
        let repo = FarmerRepository::new(&db);
        let profile = repo
            .register(new_farmer(FarmerKind::Organic, "Ana", "Reyes"))
            .await
            .unwrap();

        let code = profile.farmer.registry_code.to_lowercase();
        let found = repo.find_by_registry_code(&format!("  {code} ")).await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(profile.farmer.id));
    }

    #[tokio::test]
    async fn list_filters_by_kind_status_and_search() {
        let db = test_db().await;
        let repo = FarmerRepository::new(&db);

        let juan = repo
            .register(new_farmer(FarmerKind::Regular, "Juan", "Dela Cruz"))
            .await
            .unwrap();
        repo.register(new_farmer(FarmerKind::Organic, "Maria", "Santos"))
            .await
            .unwrap();
        repo.register(new_farmer(FarmerKind::Regular, "Jose", "100%_Rizal"))
            .await
            .unwrap();

        repo.set_status(juan.farmer.id, ApplicantStatus::Registered, None)
            .await
            .unwrap();

        let regular = repo
            .list(
                &FarmerFilter {
                    kind: Some(FarmerKind::Regular),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(regular.total, 2);

        let registered = repo
            .list(
                &FarmerFilter {
                    status: Some(ApplicantStatus::Registered),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(registered.total, 1);
        assert_eq!(registered.data[0].id, juan.farmer.id);

        let search = repo
            .list(
                &FarmerFilter {
                    search: Some("dela CRUZ".to_string()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(search.total, 1);

        // `%` and `_` match literally
        let literal = repo
            .list(
                &FarmerFilter {
                    search: Some("0%_r".to_string()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(literal.total, 1);
        assert_eq!(literal.data[0].first_name, "Jose");
    }

    #[tokio::test]
    async fn set_status_keeps_reason_only_when_not_qualified() {
        let db = test_db().await;
        let repo = FarmerRepository::new(&db);
        let id = repo
            .register(new_farmer(FarmerKind::Regular, "Juan", "Dela Cruz"))
            .await
            .unwrap()
            .farmer
            .id;

        let rejected = repo
            .set_status(
                id,
                ApplicantStatus::NotQualified,
                Some("Incomplete documents".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, "NOT_QUALIFIED");
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Incomplete documents"));

        let registered = repo
            .set_status(id, ApplicantStatus::Registered, Some("ignored".to_string()))
            .await
            .unwrap();
        assert_eq!(registered.rejection_reason, None);
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let db = test_db().await;
        let repo = FarmerRepository::new(&db);
        let id = repo
            .register(new_farmer(FarmerKind::Regular, "Juan", "Dela Cruz"))
            .await
            .unwrap()
            .farmer
            .id;

        let updated = repo
            .update(
                id,
                FarmerUpdate {
                    middle_name: Some("Santos".to_string()),
                    phone: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Juan");
        assert_eq!(updated.middle_name.as_deref(), Some("Santos"));
        assert_eq!(updated.phone, None);
        assert_eq!(updated.municipality.as_deref(), Some("Tanauan"));

        let err = repo
            .update(
                id,
                FarmerUpdate {
                    organic_certification: Some("X".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn farm_lots_and_household_management() {
        let db = test_db().await;
        let repo = FarmerRepository::new(&db);
        let other = repo
            .register(new_farmer(FarmerKind::Regular, "Other", "Farmer"))
            .await
            .unwrap();
        let profile = repo
            .register(new_farmer(FarmerKind::Regular, "Juan", "Dela Cruz"))
            .await
            .unwrap();
        let id = profile.farmer.id;

        let farm = repo
            .add_farm(
                id,
                NewFarmDetail {
                    location: "Sitio Dos".to_string(),
                    area_hectares: 0.75,
                    commodity: "Corn".to_string(),
                    tenure: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(repo.profile(id).await.unwrap().farms.len(), 2);

        // another farmer's lot is not reachable through this farmer
        let err = repo
            .delete_farm(id, other.farms[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { entity: "farm_detail" }));

        repo.delete_farm(id, farm.id).await.unwrap();
        assert_eq!(repo.profile(id).await.unwrap().farms.len(), 1);

        let household = repo
            .upsert_household(
                id,
                HouseholdInput {
                    name: "Rosa".to_string(),
                    relationship: "Mother".to_string(),
                    household_members: 3,
                },
            )
            .await
            .unwrap();
        assert_eq!(Some(household.id), profile.household.map(|h| h.id));
        assert_eq!(household.name, "Rosa");
    }

    #[tokio::test]
    async fn missing_farmer_is_not_found() {
        let db = test_db().await;
        let err = FarmerRepository::new(&db)
            .set_status(Uuid::new_v4(), ApplicantStatus::Registered, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { entity: "farmer" }));
    }
}
