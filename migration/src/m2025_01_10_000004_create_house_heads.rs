//! Migration to create the house_heads table.
//!
//! A farmer has at most one household head; the unique index on
//! `farmer_id` backs the upsert in the repository.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HouseHeads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HouseHeads::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HouseHeads::FarmerId).uuid().not_null())
                    .col(ColumnDef::new(HouseHeads::Name).text().not_null())
                    .col(ColumnDef::new(HouseHeads::Relationship).text().not_null())
                    .col(
                        ColumnDef::new(HouseHeads::HouseholdMembers)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(HouseHeads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(HouseHeads::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_house_heads_farmer_id")
                            .from(HouseHeads::Table, HouseHeads::FarmerId)
                            .to(Farmers::Table, Farmers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_house_heads_farmer_id")
                    .table(HouseHeads::Table)
                    .col(HouseHeads::FarmerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_house_heads_farmer_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(HouseHeads::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HouseHeads {
    Table,
    Id,
    FarmerId,
    Name,
    Relationship,
    HouseholdMembers,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Farmers {
    Table,
    Id,
}
