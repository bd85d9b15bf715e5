//! Migration to create the farmer_concerns table (support tickets).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FarmerConcerns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FarmerConcerns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FarmerConcerns::FarmerId).uuid().not_null())
                    .col(ColumnDef::new(FarmerConcerns::Subject).text().not_null())
                    .col(
                        ColumnDef::new(FarmerConcerns::Status)
                            .text()
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(
                        ColumnDef::new(FarmerConcerns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FarmerConcerns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_farmer_concerns_farmer_id")
                            .from(FarmerConcerns::Table, FarmerConcerns::FarmerId)
                            .to(Farmers::Table, Farmers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_farmer_concerns_farmer_id")
                    .table(FarmerConcerns::Table)
                    .col(FarmerConcerns::FarmerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_farmer_concerns_created_at")
                    .table(FarmerConcerns::Table)
                    .col(FarmerConcerns::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_farmer_concerns_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_farmer_concerns_farmer_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(FarmerConcerns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FarmerConcerns {
    Table,
    Id,
    FarmerId,
    Subject,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Farmers {
    Table,
    Id,
}
