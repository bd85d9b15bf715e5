//! Migration to create the farm_details table (farm lots per farmer).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FarmDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FarmDetails::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FarmDetails::FarmerId).uuid().not_null())
                    .col(ColumnDef::new(FarmDetails::Location).text().not_null())
                    .col(ColumnDef::new(FarmDetails::AreaHectares).double().not_null())
                    .col(ColumnDef::new(FarmDetails::Commodity).text().not_null())
                    .col(ColumnDef::new(FarmDetails::Tenure).text().null())
                    .col(
                        ColumnDef::new(FarmDetails::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_farm_details_farmer_id")
                            .from(FarmDetails::Table, FarmDetails::FarmerId)
                            .to(Farmers::Table, Farmers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_farm_details_farmer_id")
                    .table(FarmDetails::Table)
                    .col(FarmDetails::FarmerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_farm_details_farmer_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FarmDetails::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FarmDetails {
    Table,
    Id,
    FarmerId,
    Location,
    AreaHectares,
    Commodity,
    Tenure,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Farmers {
    Table,
    Id,
}
