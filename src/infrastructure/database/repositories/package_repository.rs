//! SeaORM implementation of PackageRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::db_err;
use crate::domain::{DomainError, DomainResult, MinutePackage, PackageRepository};
use crate::infrastructure::database::entities::minute_package;

pub struct SeaOrmPackageRepository {
    db: DatabaseConnection,
}

impl SeaOrmPackageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: minute_package::Model) -> MinutePackage {
    MinutePackage {
        id: m.id,
        name: m.name,
        minutes: m.minutes,
        price_cents: m.price_cents,
        currency: m.currency,
        is_active: m.is_active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[async_trait]
impl PackageRepository for SeaOrmPackageRepository {
    async fn save(&self, p: MinutePackage) -> DomainResult<()> {
        debug!("Saving minute package: {} ({} min)", p.name, p.minutes);

        let model = minute_package::ActiveModel {
            id: Set(p.id),
            name: Set(p.name),
            minutes: Set(p.minutes),
            price_cents: Set(p.price_cents),
            currency: Set(p.currency),
            is_active: Set(p.is_active),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        };
        model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<MinutePackage>> {
        let model = minute_package::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<MinutePackage>> {
        let models = minute_package::Entity::find()
            .order_by_asc(minute_package::Column::Minutes)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_active(&self) -> DomainResult<Vec<MinutePackage>> {
        let models = minute_package::Entity::find()
            .filter(minute_package::Column::IsActive.eq(true))
            .order_by_asc(minute_package::Column::Minutes)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<()> {
        let result = minute_package::Entity::update_many()
            .col_expr(minute_package::Column::IsActive, Expr::value(is_active))
            .col_expr(minute_package::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(minute_package::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("MinutePackage", "id", id));
        }
        Ok(())
    }

    async fn count(&self) -> DomainResult<u64> {
        minute_package::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}
