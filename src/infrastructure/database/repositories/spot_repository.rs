//! SeaORM implementation of SpotRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::db_err;
use crate::domain::{DomainError, DomainResult, ParkingSpot, SpotRepository, SpotStatus, SpotType};
use crate::infrastructure::database::entities::parking_spot;

pub struct SeaOrmSpotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSpotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: parking_spot::Model) -> ParkingSpot {
    ParkingSpot {
        spot_type: SpotType::from_str(&m.spot_type).unwrap_or_default(),
        status: SpotStatus::from_str(&m.status).unwrap_or_default(),
        id: m.id,
        number: m.number,
        location: m.location,
        is_occupied: m.is_occupied,
        current_session_id: m.current_session_id,
        last_updated: m.last_updated,
        created_at: m.created_at,
    }
}

#[async_trait]
impl SpotRepository for SeaOrmSpotRepository {
    async fn save(&self, s: ParkingSpot) -> DomainResult<()> {
        debug!("Saving parking spot: {} ({})", s.number, s.id);

        let model = parking_spot::ActiveModel {
            id: Set(s.id),
            number: Set(s.number.clone()),
            location: Set(s.location),
            is_occupied: Set(s.is_occupied),
            current_session_id: Set(s.current_session_id),
            spot_type: Set(s.spot_type.as_str().to_string()),
            status: Set(s.status.as_str().to_string()),
            last_updated: Set(s.last_updated),
            created_at: Set(s.created_at),
        };
        model.insert(&self.db).await.map_err(|e| match db_err(e) {
            DomainError::Conflict(_) => {
                DomainError::Conflict(format!("spot number {} already exists", s.number))
            }
            other => other,
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSpot>> {
        let model = parking_spot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<ParkingSpot>> {
        let model = parking_spot::Entity::find()
            .filter(parking_spot::Column::Number.eq(number))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingSpot>> {
        let models = parking_spot::Entity::find()
            .order_by_asc(parking_spot::Column::Number)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_available(&self) -> DomainResult<Vec<ParkingSpot>> {
        let models = parking_spot::Entity::find()
            .filter(parking_spot::Column::IsOccupied.eq(false))
            .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_str()))
            .order_by_asc(parking_spot::Column::Number)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update_status(&self, id: &str, status: SpotStatus) -> DomainResult<()> {
        debug!("Updating parking spot {} status to {}", id, status);

        let result = parking_spot::Entity::update_many()
            .col_expr(parking_spot::Column::Status, Expr::value(status.as_str()))
            .col_expr(parking_spot::Column::LastUpdated, Expr::value(Utc::now()))
            .filter(parking_spot::Column::Id.eq(id))
            .filter(parking_spot::Column::IsOccupied.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return match self.find_by_id(id).await? {
                None => Err(DomainError::not_found("ParkingSpot", "id", id)),
                Some(_) => Err(DomainError::SpotUnavailable {
                    spot_id: id.to_string(),
                }),
            };
        }
        Ok(())
    }
}
