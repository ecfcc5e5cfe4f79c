//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::ledger::Ledger;
use crate::domain::package::PackageRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::session::SessionRepository;
use crate::domain::spot::SpotRepository;
use crate::domain::user::UserRepository;

use super::ledger::SeaOrmLedger;
use super::package_repository::SeaOrmPackageRepository;
use super::payment_repository::SeaOrmPaymentRepository;
use super::session_repository::SeaOrmSessionRepository;
use super::spot_repository::SeaOrmSpotRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let user = repos.users().find_by_phone("+50499887766").await?;
/// let active = repos.sessions().find_active_for_user(&user.id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    users: SeaOrmUserRepository,
    spots: SeaOrmSpotRepository,
    packages: SeaOrmPackageRepository,
    sessions: SeaOrmSessionRepository,
    payments: SeaOrmPaymentRepository,
    ledger: SeaOrmLedger,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            spots: SeaOrmSpotRepository::new(db.clone()),
            packages: SeaOrmPackageRepository::new(db.clone()),
            sessions: SeaOrmSessionRepository::new(db.clone()),
            payments: SeaOrmPaymentRepository::new(db.clone()),
            ledger: SeaOrmLedger::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn spots(&self) -> &dyn SpotRepository {
        &self.spots
    }

    fn packages(&self) -> &dyn PackageRepository {
        &self.packages
    }

    fn sessions(&self) -> &dyn SessionRepository {
        &self.sessions
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }

    fn ledger(&self) -> &dyn Ledger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::application::services::{PaymentManager, PurchaseRequest, SessionManager, StartSession};
    use crate::domain::billing::ParkingRate;
    use crate::domain::{
        DomainError, GetUserDto, MinutePackage, ParkingSession, ParkingSpot, PaymentMethod,
        PaymentTransaction, PurchaseMethod, SpotStatus, SpotType, User, UserRole,
    };
    use crate::infrastructure::database::{init_database, run_migrations, DatabaseConfig};
    use crate::shared::{ManualClock, PaginationParams};

    async fn provider() -> SeaOrmRepositoryProvider {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();
        SeaOrmRepositoryProvider::new(db)
    }

    fn user(id: &str, phone: &str, balance: i64) -> User {
        User {
            id: id.into(),
            phone: phone.into(),
            name: "Ana".into(),
            email: None,
            role: UserRole::Client,
            is_active: true,
            balance_minutes: balance,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn balance(repos: &SeaOrmRepositoryProvider, id: &str) -> i64 {
        repos.users().find_by_id(id).await.unwrap().unwrap().balance_minutes
    }

    #[tokio::test]
    async fn users_round_trip_and_phone_is_unique() {
        let repos = provider().await;
        repos.users().create(user("u1", "+50499887766", 30)).await.unwrap();

        let found = repos.users().find_by_phone("+50499887766").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(found.balance_minutes, 30);

        let err = repos
            .users()
            .create(user("u2", "+50499887766", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let page = repos
            .users()
            .list(GetUserDto {
                search: Some("Ana".into()),
                role: None,
                pagination: PaginationParams::new(1, 10),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn index_rejects_second_active_session() {
        let repos = provider().await;
        repos.users().create(user("u1", "+50499887766", 30)).await.unwrap();

        let now = Utc::now();
        let first = ParkingSession::start("u1", "+50499887766", "Ana", "Gate", None, now);
        repos.ledger().open_session(&first).await.unwrap();

        let second = ParkingSession::start("u1", "+50499887766", "Ana", "Gate", None, now);
        let err = repos.ledger().open_session(&second).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionAlreadyActive { .. }));

        let active = repos.sessions().find_active_for_user("u1").await.unwrap().unwrap();
        assert_eq!(active.id, first.id);
    }

    #[tokio::test]
    async fn close_is_conditional_and_debits_once() {
        let repos = provider().await;
        repos.users().create(user("u1", "+50499887766", 20)).await.unwrap();
        let spot = ParkingSpot::new("A1", "Level 1", SpotType::Regular);
        let spot_id = spot.id.clone();
        repos.spots().save(spot).await.unwrap();

        let t0 = Utc::now();
        let mut session =
            ParkingSession::start("u1", "+50499887766", "Ana", "Gate", Some(spot_id.clone()), t0);
        repos.ledger().open_session(&session).await.unwrap();

        let occupied = repos.spots().find_by_id(&spot_id).await.unwrap().unwrap();
        assert_eq!(occupied.status, SpotStatus::Occupied);
        assert_eq!(occupied.current_session_id.as_deref(), Some(session.id.as_str()));

        let bill = session
            .complete(t0 + Duration::minutes(30), &ParkingRate::default(), PaymentMethod::Balance, None)
            .unwrap();
        let debit = repos
            .ledger()
            .close_session(&session, Some(bill.duration_minutes))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(debit.previous_minutes, 20);
        assert_eq!(debit.new_minutes, 0);
        assert_eq!(debit.shortfall_minutes, 10);

        let err = repos
            .ledger()
            .close_session(&session, Some(bill.duration_minutes))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SessionNotActive { .. }));
        assert_eq!(balance(&repos, "u1").await, 0);

        let released = repos.spots().find_by_id(&spot_id).await.unwrap().unwrap();
        assert!(released.is_available());

        let stored = repos.sessions().find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.bill().unwrap().duration_minutes, 30);
        assert_eq!(stored.bill().unwrap().cost_cents, 3000);
    }

    #[tokio::test]
    async fn cancelled_session_round_trips() {
        let repos = provider().await;
        repos.users().create(user("u1", "+50499887766", 20)).await.unwrap();
        let spot = ParkingSpot::new("A1", "Level 1", SpotType::Regular);
        let spot_id = spot.id.clone();
        repos.spots().save(spot).await.unwrap();

        let t0 = Utc::now();
        let mut session =
            ParkingSession::start("u1", "+50499887766", "Ana", "Gate", Some(spot_id.clone()), t0);
        repos.ledger().open_session(&session).await.unwrap();

        let cancelled_at = t0 + Duration::minutes(3);
        session
            .cancel(cancelled_at, Some("wrong vehicle".into()))
            .unwrap();
        let debit = repos.ledger().close_session(&session, None).await.unwrap();
        assert!(debit.is_none());

        let stored = repos.sessions().find_by_id(&session.id).await.unwrap().unwrap();
        match &stored.state {
            crate::domain::SessionState::Cancelled {
                cancelled_at: at,
                reason,
            } => {
                assert_eq!(at.timestamp(), cancelled_at.timestamp());
                assert_eq!(reason.as_deref(), Some("wrong vehicle"));
            }
            other => panic!("expected cancelled session, got {:?}", other),
        }
        assert!(stored.bill().is_none());
        assert!(repos.sessions().find_active_for_user("u1").await.unwrap().is_none());

        let released = repos.spots().find_by_id(&spot_id).await.unwrap().unwrap();
        assert!(released.is_available());
        assert_eq!(balance(&repos, "u1").await, 20);
    }

    #[tokio::test]
    async fn occupied_spot_cannot_be_opened_twice() {
        let repos = provider().await;
        repos.users().create(user("u1", "+50499887766", 0)).await.unwrap();
        repos.users().create(user("u2", "+50499887755", 0)).await.unwrap();
        let spot = ParkingSpot::new("A1", "Level 1", SpotType::Regular);
        let spot_id = spot.id.clone();
        repos.spots().save(spot).await.unwrap();

        let now = Utc::now();
        let a = ParkingSession::start("u1", "+50499887766", "Ana", "Gate", Some(spot_id.clone()), now);
        repos.ledger().open_session(&a).await.unwrap();

        let b = ParkingSession::start("u2", "+50499887755", "Luis", "Gate", Some(spot_id.clone()), now);
        let err = repos.ledger().open_session(&b).await.unwrap_err();
        assert!(matches!(err, DomainError::SpotUnavailable { .. }));
        // rolled back with the spot update
        assert!(repos.sessions().find_active_for_user("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settle_credits_only_once() {
        let repos = provider().await;
        let owner = user("u1", "+50499887766", 0);
        repos.users().create(owner.clone()).await.unwrap();
        let package = MinutePackage::new("1 hour", 60, 5000, "HNL").unwrap();
        repos.packages().save(package.clone()).await.unwrap();

        let mut tx = PaymentTransaction::purchase(
            &owner,
            &package,
            PurchaseMethod::Transfer,
            Some("REF-1".into()),
            None,
            Utc::now(),
        );
        repos.ledger().record_transaction(&tx).await.unwrap();
        assert_eq!(balance(&repos, "u1").await, 0);

        tx.complete(Utc::now(), Some("admin".into())).unwrap();
        assert!(repos.ledger().settle_transaction(&tx).await.unwrap());
        assert!(!repos.ledger().settle_transaction(&tx).await.unwrap());
        assert_eq!(balance(&repos, "u1").await, 60);

        let stored = repos.payments().find_by_id(&tx.id).await.unwrap().unwrap();
        assert!(stored.status.is_completed());
        assert!(repos.payments().find_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_payment_intent_is_a_conflict() {
        let repos = provider().await;
        let owner = user("u1", "+50499887766", 0);
        repos.users().create(owner.clone()).await.unwrap();
        let package = MinutePackage::new("1 hour", 60, 5000, "HNL").unwrap();
        repos.packages().save(package.clone()).await.unwrap();

        let first = PaymentTransaction::card_intent(&owner, &package, "pi_123", None, Utc::now());
        repos.ledger().record_transaction(&first).await.unwrap();

        let again = PaymentTransaction::card_intent(&owner, &package, "pi_123", None, Utc::now());
        let err = repos.ledger().record_transaction(&again).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let found = repos.payments().find_by_payment_intent("pi_123").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn managers_run_against_sqlite() {
        let repos = Arc::new(provider().await);
        repos.users().create(user("u1", "+50499887766", 0)).await.unwrap();
        let package = MinutePackage::new("2 hours", 120, 9000, "HNL").unwrap();
        let package_id = package.id.clone();
        repos.packages().save(package).await.unwrap();

        let payments = PaymentManager::new(repos.clone(), "HNL");
        payments
            .process_purchase(PurchaseRequest {
                user_id: "u1".into(),
                package_id,
                method: PurchaseMethod::Cash,
                reference: None,
                processed_by: Some("admin".into()),
            })
            .await
            .unwrap();
        assert_eq!(balance(&repos, "u1").await, 120);

        let clock = ManualClock::new(Utc::now());
        let sessions = SessionManager::new(repos.clone(), ParkingRate::default())
            .with_clock(Arc::new(clock.clone()));
        let session = sessions
            .start_session(StartSession {
                user_id: "u1".into(),
                location: "Mall North".into(),
                spot_id: None,
            })
            .await
            .unwrap();
        clock.advance(Duration::seconds(45 * 60 + 1));
        let ended = sessions
            .end_session(&session.id, Some("g1".into()), PaymentMethod::Balance)
            .await
            .unwrap();

        assert_eq!(ended.bill().unwrap().duration_minutes, 46);
        assert_eq!(balance(&repos, "u1").await, 74);
    }
}
