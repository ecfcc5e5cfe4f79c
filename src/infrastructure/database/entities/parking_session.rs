//! Parking session entity
//!
//! Billing columns are null while the session is active and written once
//! when it completes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,
    pub user_phone: String,
    pub user_name: String,

    pub started_at: DateTimeUtc,
    pub location: String,
    #[sea_orm(nullable)]
    pub spot_id: Option<String>,
    pub qr_code: String,

    /// active, completed, cancelled
    pub status: String,

    /// End time for completed sessions, cancel time for cancelled ones
    #[sea_orm(nullable)]
    pub ended_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub duration_minutes: Option<i64>,
    #[sea_orm(nullable)]
    pub cost_cents: Option<i64>,
    #[sea_orm(nullable)]
    pub payment_method: Option<String>,
    #[sea_orm(nullable)]
    pub guard_id: Option<String>,
    #[sea_orm(nullable)]
    pub cancel_reason: Option<String>,
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
