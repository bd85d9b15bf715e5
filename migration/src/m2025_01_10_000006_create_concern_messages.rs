//! Migration to create the concern_messages table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConcernMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConcernMessages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConcernMessages::ConcernId).uuid().not_null())
                    .col(ColumnDef::new(ConcernMessages::SenderType).text().not_null())
                    .col(ColumnDef::new(ConcernMessages::SenderId).uuid().not_null())
                    .col(ColumnDef::new(ConcernMessages::Body).text().not_null())
                    .col(
                        ColumnDef::new(ConcernMessages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_concern_messages_concern_id")
                            .from(ConcernMessages::Table, ConcernMessages::ConcernId)
                            .to(FarmerConcerns::Table, FarmerConcerns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_concern_messages_concern_id_created_at")
                    .table(ConcernMessages::Table)
                    .col(ConcernMessages::ConcernId)
                    .col(ConcernMessages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_concern_messages_concern_id_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ConcernMessages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConcernMessages {
    Table,
    Id,
    ConcernId,
    SenderType,
    SenderId,
    Body,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FarmerConcerns {
    Table,
    Id,
}
