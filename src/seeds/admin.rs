//! Administrator seeding

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::auth::password::hash_in_background;
use crate::config::AppConfig;
use crate::repositories::AdminRepository;

/// Create the configured admin unless one with that email already exists.
///
/// Returns `true` when an account was created. Without `SEED_ADMIN_EMAIL` and
/// `SEED_ADMIN_PASSWORD` this is a no-op.
pub async fn seed_admin(db: &DatabaseConnection, config: &AppConfig) -> Result<bool> {
    let (Some(email), Some(password)) = (&config.seed_admin_email, &config.seed_admin_password)
    else {
        log::debug!("No seed admin configured, skipping");
        return Ok(false);
    };

    let repo = AdminRepository::new(db);
    if repo.email_exists(email).await? {
        log::info!("Admin '{}' already exists, skipping", email);
        return Ok(false);
    }

    let password_hash = hash_in_background(password.clone())
        .await
        .context("Failed to hash seed admin password")?;
    let admin = repo
        .create(email, &config.seed_admin_name, password_hash)
        .await
        .context("Failed to create seed admin")?;

    log::info!("Created admin '{}' ({})", admin.email, admin.id);
    Ok(true)
}
