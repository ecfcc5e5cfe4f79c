//! Create minute packages table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MinutePackages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MinutePackages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MinutePackages::Name).string().not_null())
                    .col(
                        ColumnDef::new(MinutePackages::Minutes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MinutePackages::PriceCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MinutePackages::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MinutePackages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(MinutePackages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MinutePackages::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MinutePackages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum MinutePackages {
    Table,
    Id,
    Name,
    Minutes,
    PriceCents,
    Currency,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
