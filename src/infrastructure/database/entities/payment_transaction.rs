//! Payment transaction entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,
    pub user_phone: String,
    pub user_name: String,

    /// purchase, parking, refund
    pub tx_type: String,
    /// transfer, cash, card
    pub method: String,
    pub amount_cents: i64,
    pub currency: String,
    pub minutes: i64,
    #[sea_orm(nullable)]
    pub reference: Option<String>,

    #[sea_orm(nullable)]
    pub package_id: Option<String>,
    #[sea_orm(nullable, unique)]
    pub payment_intent_id: Option<String>,
    #[sea_orm(nullable)]
    pub payment_method_id: Option<String>,
    #[sea_orm(nullable)]
    pub note: Option<String>,

    /// pending, completed, cancelled, failed
    pub status: String,
    /// When the row left `pending`
    #[sea_orm(nullable)]
    pub status_changed_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub status_reason: Option<String>,

    #[sea_orm(nullable)]
    pub processed_by: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
