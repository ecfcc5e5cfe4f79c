//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::db_err;
use crate::domain::{DomainError, DomainResult, GetUserDto, User, UserRepository, UserRole};
use crate::infrastructure::database::entities::user;
use crate::shared::PaginatedResult;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: user::Model) -> User {
    User {
        role: UserRole::from_str(&m.role).unwrap_or_default(),
        id: m.id,
        phone: m.phone,
        name: m.name,
        email: m.email,
        is_active: m.is_active,
        balance_minutes: m.balance_minutes,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

// ── UserRepository impl ─────────────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, u: User) -> DomainResult<()> {
        debug!("Creating user: {}", u.id);

        let model = user::ActiveModel {
            id: Set(u.id),
            phone: Set(u.phone.clone()),
            name: Set(u.name),
            email: Set(u.email),
            role: Set(u.role.as_str().to_string()),
            is_active: Set(u.is_active),
            balance_minutes: Set(u.balance_minutes),
            created_at: Set(u.created_at),
            updated_at: Set(u.updated_at),
        };
        model.insert(&self.db).await.map_err(|e| match db_err(e) {
            DomainError::Conflict(_) => {
                DomainError::Conflict(format!("phone {} already registered", u.phone))
            }
            other => other,
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let mut query = user::Entity::find();

        if let Some(ref search) = dto.search {
            query = query.filter(
                Condition::any()
                    .add(user::Column::Name.contains(search))
                    .add(user::Column::Phone.contains(search)),
            );
        }
        if let Some(role) = dto.role {
            query = query.filter(user::Column::Role.eq(role.as_str()));
        }
        query = query.order_by_desc(user::Column::CreatedAt);

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let page = dto.pagination;
        let models = query
            .offset(page.offset())
            .limit(page.limit as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models.into_iter().map(model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }

    async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<Option<User>> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(db_err)?;

        Ok(Some(model_to_domain(updated)))
    }
}
