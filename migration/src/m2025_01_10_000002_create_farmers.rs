//! Migration to create the farmers table.
//!
//! Regular and organic farmers share one table and are told apart by `kind`.
//! The registry code is the identifier printed on a farmer's QR card.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Farmers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Farmers::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Farmers::RegistryCode)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Farmers::Kind).text().not_null())
                    .col(
                        ColumnDef::new(Farmers::Status)
                            .text()
                            .not_null()
                            .default("APPLICANTS"),
                    )
                    .col(ColumnDef::new(Farmers::FirstName).text().not_null())
                    .col(ColumnDef::new(Farmers::MiddleName).text().null())
                    .col(ColumnDef::new(Farmers::LastName).text().not_null())
                    .col(ColumnDef::new(Farmers::Sex).text().null())
                    .col(ColumnDef::new(Farmers::BirthDate).date().null())
                    .col(ColumnDef::new(Farmers::Email).text().null())
                    .col(ColumnDef::new(Farmers::Phone).text().null())
                    .col(ColumnDef::new(Farmers::Barangay).text().null())
                    .col(ColumnDef::new(Farmers::Municipality).text().null())
                    .col(ColumnDef::new(Farmers::Province).text().null())
                    .col(ColumnDef::new(Farmers::Photo).text().null())
                    .col(ColumnDef::new(Farmers::OrganicCertification).text().null())
                    .col(ColumnDef::new(Farmers::RejectionReason).text().null())
                    .col(ColumnDef::new(Farmers::PasswordHash).text().null())
                    .col(
                        ColumnDef::new(Farmers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Farmers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Admin worklists filter by kind and status, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_farmers_kind_status_created_at")
                    .table(Farmers::Table)
                    .col(Farmers::Kind)
                    .col(Farmers::Status)
                    .col(Farmers::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_farmers_kind_status_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Farmers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Farmers {
    Table,
    Id,
    RegistryCode,
    Kind,
    Status,
    FirstName,
    MiddleName,
    LastName,
    Sex,
    BirthDate,
    Email,
    Phone,
    Barangay,
    Municipality,
    Province,
    Photo,
    OrganicCertification,
    RejectionReason,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}
