//! # Concern Repository
//!
//! Support tickets raised by farmers and their message threads.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::listing::{DateRange, Page, PageRequest, paginate, search_condition};
use crate::models::concern_message::{
    self, ActiveModel as ConcernMessageActiveModel, Model as ConcernMessageModel,
};
use crate::models::farmer_concern::{
    self, ActiveModel as FarmerConcernActiveModel, Model as FarmerConcernModel,
};
use crate::models::{ConcernMessage, ConcernStatus, FarmerConcern, SenderType};

pub const MAX_SUBJECT_LENGTH: usize = 200;
pub const MAX_MESSAGE_LENGTH: usize = 5000;

/// Concern list filters
#[derive(Debug, Clone, Default)]
pub struct ConcernFilter {
    pub farmer_id: Option<Uuid>,
    pub status: Option<ConcernStatus>,
    /// Matched against the subject
    pub search: Option<String>,
    pub created: DateRange,
}

/// Concern with its messages in chronological order
#[derive(Debug, Clone)]
pub struct ConcernThread {
    pub concern: FarmerConcernModel,
    pub messages: Vec<ConcernMessageModel>,
}

/// Who is posting
#[derive(Debug, Clone, Copy)]
pub struct Sender {
    pub sender_type: SenderType,
    pub sender_id: Uuid,
}

fn validate_body(body: &str) -> Result<String, RepositoryError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(RepositoryError::validation_error("Message cannot be empty"));
    }
    if body.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(RepositoryError::validation_error(format!(
            "Message cannot exceed {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(body.to_string())
}

/// Repository for concern database operations
pub struct ConcernRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ConcernRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open a concern for `farmer_id` with its first message
    pub async fn open(
        &self,
        farmer_id: Uuid,
        sender_type: SenderType,
        subject: &str,
        body: &str,
    ) -> Result<ConcernThread, RepositoryError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(RepositoryError::validation_error("Subject cannot be empty"));
        }
        if subject.chars().count() > MAX_SUBJECT_LENGTH {
            return Err(RepositoryError::validation_error(format!(
                "Subject cannot exceed {MAX_SUBJECT_LENGTH} characters"
            )));
        }
        let body = validate_body(body)?;

        let now = Utc::now();
        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;

        let concern = FarmerConcernActiveModel {
            id: Set(Uuid::new_v4()),
            farmer_id: Set(farmer_id),
            subject: Set(subject.to_string()),
            status: Set(ConcernStatus::Open.as_str().to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(RepositoryError::database_error)?;

        let message = ConcernMessageActiveModel {
            id: Set(Uuid::new_v4()),
            concern_id: Set(concern.id),
            sender_type: Set(sender_type.as_str().to_string()),
            sender_id: Set(farmer_id),
            body: Set(body),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(RepositoryError::database_error)?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        tracing::info!(concern_id = %concern.id, farmer_id = %farmer_id, "Concern opened");

        Ok(ConcernThread {
            concern,
            messages: vec![message],
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FarmerConcernModel>, RepositoryError> {
        FarmerConcern::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Fetch a concern visible to the caller.
    ///
    /// With `owner` set, a concern belonging to someone else reads as not found.
    pub async fn get_visible(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<FarmerConcernModel, RepositoryError> {
        self.find_by_id(id)
            .await?
            .filter(|concern| owner.is_none_or(|owner| concern.farmer_id == owner))
            .ok_or_else(|| RepositoryError::not_found("concern"))
    }

    /// Concern with messages, oldest first
    pub async fn thread(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<ConcernThread, RepositoryError> {
        let concern = self.get_visible(id, owner).await?;
        let messages = concern
            .find_related(ConcernMessage)
            .order_by_asc(concern_message::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(ConcernThread { concern, messages })
    }

    /// Filtered, newest-first page of concerns
    pub async fn list(
        &self,
        filter: &ConcernFilter,
        page: PageRequest,
    ) -> Result<Page<FarmerConcernModel>, RepositoryError> {
        let mut condition =
            Condition::all().add(filter.created.condition(farmer_concern::Column::CreatedAt));
        if let Some(farmer_id) = filter.farmer_id {
            condition = condition.add(farmer_concern::Column::FarmerId.eq(farmer_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(farmer_concern::Column::Status.eq(status.as_str()));
        }
        if let Some(search) =
            search_condition(filter.search.as_deref(), &[farmer_concern::Column::Subject])
        {
            condition = condition.add(search);
        }

        let select = FarmerConcern::find()
            .filter(condition)
            .order_by_desc(farmer_concern::Column::CreatedAt);

        paginate(self.db, select, page)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Append a message. A farmer replying to a resolved concern reopens it.
    pub async fn add_message(
        &self,
        concern: FarmerConcernModel,
        sender: Sender,
        body: &str,
    ) -> Result<(FarmerConcernModel, ConcernMessageModel), RepositoryError> {
        let body = validate_body(body)?;
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;

        let message = ConcernMessageActiveModel {
            id: Set(Uuid::new_v4()),
            concern_id: Set(concern.id),
            sender_type: Set(sender.sender_type.as_str().to_string()),
            sender_id: Set(sender.sender_id),
            body: Set(body),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(RepositoryError::database_error)?;

        let reopen = sender.sender_type != SenderType::Admin
            && concern.status == ConcernStatus::Resolved.as_str();

        let mut active = concern.into_active_model();
        if reopen {
            active.status = Set(ConcernStatus::Open.as_str().to_string());
        }
        active.updated_at = Set(now.into());
        let concern = active
            .update(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        if reopen {
            tracing::info!(concern_id = %concern.id, "Concern reopened by farmer reply");
        }

        Ok((concern, message))
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: ConcernStatus,
    ) -> Result<FarmerConcernModel, RepositoryError> {
        let concern = self.get_visible(id, None).await?;
        let mut active = concern.into_active_model();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
