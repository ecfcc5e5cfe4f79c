//! Create parking sessions table
//!
//! A partial unique index allows at most one `active` row per user. The
//! statement is raw SQL accepted by both SQLite and PostgreSQL.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

use super::m20250101_000001_create_users::Users;

const ONE_ACTIVE_PER_USER: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
    idx_parking_sessions_one_active_per_user \
    ON parking_sessions (user_id) WHERE status = 'active'";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSessions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingSessions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(ParkingSessions::UserPhone)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingSessions::UserName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingSessions::Location)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ParkingSessions::SpotId).string())
                    .col(ColumnDef::new(ParkingSessions::QrCode).string().not_null())
                    .col(
                        ColumnDef::new(ParkingSessions::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(ParkingSessions::EndedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ParkingSessions::DurationMinutes).big_integer())
                    .col(ColumnDef::new(ParkingSessions::CostCents).big_integer())
                    .col(ColumnDef::new(ParkingSessions::PaymentMethod).string_len(20))
                    .col(ColumnDef::new(ParkingSessions::GuardId).string())
                    .col(ColumnDef::new(ParkingSessions::CancelReason).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_sessions_user")
                            .from(ParkingSessions::Table, ParkingSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_sessions_user")
                    .table(ParkingSessions::Table)
                    .col(ParkingSessions::UserId)
                    .col(ParkingSessions::StartedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_sessions_status")
                    .table(ParkingSessions::Table)
                    .col(ParkingSessions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_sessions_qr_code")
                    .table(ParkingSessions::Table)
                    .col(ParkingSessions::QrCode)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(ONE_ACTIVE_PER_USER)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSessions {
    Table,
    Id,
    UserId,
    UserPhone,
    UserName,
    StartedAt,
    Location,
    SpotId,
    QrCode,
    Status,
    EndedAt,
    DurationMinutes,
    CostCents,
    PaymentMethod,
    GuardId,
    CancelReason,
}
