//! # Admin Repository
//!
//! Lookup and creation of administrator accounts.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::admin::{self, ActiveModel as AdminActiveModel, Entity as Admin, Model as AdminModel};

/// Repository for Admin database operations
pub struct AdminRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AdminRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find an admin by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<AdminModel>, RepositoryError> {
        Admin::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(admin::Column::Email)))
                    .eq(email.trim().to_lowercase()),
            )
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminModel>, RepositoryError> {
        Admin::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Create an admin; `password_hash` must already be an Argon2 PHC string.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: String,
    ) -> Result<AdminModel, RepositoryError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(RepositoryError::validation_error("Admin email is invalid"));
        }
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_error("Admin name cannot be empty"));
        }

        let now = Utc::now();
        AdminActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name.trim().to_string()),
            password_hash: Set(password_hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    /// Whether an admin with this email exists
    pub async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.find_by_email(email).await?.is_some())
    }
}
