//! Create parking spots table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSpots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSpots::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::Number)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ParkingSpots::Location).string().not_null())
                    .col(
                        ColumnDef::new(ParkingSpots::IsOccupied)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ParkingSpots::CurrentSessionId).string())
                    .col(
                        ColumnDef::new(ParkingSpots::SpotType)
                            .string_len(20)
                            .not_null()
                            .default("regular"),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::Status)
                            .string_len(20)
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_status")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSpots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSpots {
    Table,
    Id,
    Number,
    Location,
    IsOccupied,
    CurrentSessionId,
    SpotType,
    Status,
    LastUpdated,
    CreatedAt,
}
