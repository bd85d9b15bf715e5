//! Database migrations for the farmer registry.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_admins;
mod m2025_01_10_000002_create_farmers;
mod m2025_01_10_000003_create_farm_details;
mod m2025_01_10_000004_create_house_heads;
mod m2025_01_10_000005_create_farmer_concerns;
mod m2025_01_10_000006_create_concern_messages;
mod m2025_01_10_000007_create_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_admins::Migration),
            Box::new(m2025_01_10_000002_create_farmers::Migration),
            Box::new(m2025_01_10_000003_create_farm_details::Migration),
            Box::new(m2025_01_10_000004_create_house_heads::Migration),
            Box::new(m2025_01_10_000005_create_farmer_concerns::Migration),
            Box::new(m2025_01_10_000006_create_concern_messages::Migration),
            Box::new(m2025_01_10_000007_create_events::Migration),
        ]
    }
}
