//! User entity for database

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub phone: String,
    pub name: String,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    /// client, guard, admin
    pub role: String,
    pub is_active: bool,
    /// Prepaid parking minutes
    pub balance_minutes: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parking_session::Entity")]
    ParkingSessions,
    #[sea_orm(has_many = "super::payment_transaction::Entity")]
    PaymentTransactions,
}

impl Related<super::parking_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingSessions.def()
    }
}

impl Related<super::payment_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
