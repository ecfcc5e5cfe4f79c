//! Create payment transactions table

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::UserPhone)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::UserName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::TxType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::Method)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::AmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::Minutes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PaymentTransactions::Reference).string())
                    .col(ColumnDef::new(PaymentTransactions::PackageId).string())
                    .col(
                        ColumnDef::new(PaymentTransactions::PaymentIntentId)
                            .string()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PaymentTransactions::PaymentMethodId).string())
                    .col(ColumnDef::new(PaymentTransactions::Note).string())
                    .col(
                        ColumnDef::new(PaymentTransactions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::StatusChangedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(PaymentTransactions::StatusReason).string())
                    .col(ColumnDef::new(PaymentTransactions::ProcessedBy).string())
                    .col(
                        ColumnDef::new(PaymentTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_transactions_user")
                            .from(PaymentTransactions::Table, PaymentTransactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_transactions_user")
                    .table(PaymentTransactions::Table)
                    .col(PaymentTransactions::UserId)
                    .col(PaymentTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_transactions_status")
                    .table(PaymentTransactions::Table)
                    .col(PaymentTransactions::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentTransactions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum PaymentTransactions {
    Table,
    Id,
    UserId,
    UserPhone,
    UserName,
    TxType,
    Method,
    AmountCents,
    Currency,
    Minutes,
    Reference,
    PackageId,
    PaymentIntentId,
    PaymentMethodId,
    Note,
    Status,
    StatusChangedAt,
    StatusReason,
    ProcessedBy,
    CreatedAt,
}
