//! In-memory repository provider for development and testing
//!
//! Ledger operations take a single commit lock so each one is observed as
//! a whole, matching what a database transaction gives the SeaORM backend.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::{
    BalanceDebit, DomainError, DomainResult, GetUserDto, Ledger, MinutePackage, PackageRepository,
    ParkingSession, ParkingSpot, PaymentRepository, PaymentTransaction, RepositoryProvider,
    SessionRepository, SpotRepository, SpotStatus, User, UserRepository,
};
use crate::shared::PaginatedResult;

#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    users: DashMap<String, User>,
    spots: DashMap<String, ParkingSpot>,
    packages: DashMap<String, MinutePackage>,
    sessions: DashMap<String, ParkingSession>,
    payments: DashMap<String, PaymentTransaction>,
    commit: Mutex<()>,
    injected_failures: AtomicU32,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` ledger writes fail with a storage error.
    pub fn fail_next_ledger_writes(&self, count: u32) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> DomainResult<()> {
        let took = self
            .injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if took {
            return Err(DomainError::Storage("injected ledger failure".into()));
        }
        Ok(())
    }

    fn credit(&self, user_id: &str, minutes: i64) -> DomainResult<()> {
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;
        user.balance_minutes += minutes;
        user.updated_at = Utc::now();
        Ok(())
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        self
    }
    fn spots(&self) -> &dyn SpotRepository {
        self
    }
    fn packages(&self) -> &dyn PackageRepository {
        self
    }
    fn sessions(&self) -> &dyn SessionRepository {
        self
    }
    fn payments(&self) -> &dyn PaymentRepository {
        self
    }
    fn ledger(&self) -> &dyn Ledger {
        self
    }
}

// ── Users ──────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for InMemoryRepositoryProvider {
    async fn create(&self, user: User) -> DomainResult<()> {
        if self.users.iter().any(|u| u.phone == user.phone) {
            return Err(DomainError::Conflict(format!("phone {} already registered", user.phone)));
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.phone == phone)
            .map(|u| u.value().clone()))
    }

    async fn list(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let search = dto.search.map(|s| s.to_lowercase());
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|u| u.value().clone())
            .filter(|u| dto.role.map_or(true, |r| u.role == r))
            .filter(|u| {
                search.as_deref().map_or(true, |s| {
                    u.name.to_lowercase().contains(s) || u.phone.contains(s)
                })
            })
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PaginatedResult::from_vec(users, dto.pagination))
    }

    async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<Option<User>> {
        Ok(self.users.get_mut(id).map(|mut u| {
            u.is_active = is_active;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }
}

// ── Spots ──────────────────────────────────────────────────────

#[async_trait]
impl SpotRepository for InMemoryRepositoryProvider {
    async fn save(&self, spot: ParkingSpot) -> DomainResult<()> {
        if self
            .spots
            .iter()
            .any(|s| s.number == spot.number && s.id != spot.id)
        {
            return Err(DomainError::Conflict(format!("spot number {} already exists", spot.number)));
        }
        self.spots.insert(spot.id.clone(), spot);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSpot>> {
        Ok(self.spots.get(id).map(|s| s.clone()))
    }

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<ParkingSpot>> {
        Ok(self
            .spots
            .iter()
            .find(|s| s.number == number)
            .map(|s| s.value().clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingSpot>> {
        let mut spots: Vec<ParkingSpot> = self.spots.iter().map(|s| s.value().clone()).collect();
        spots.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(spots)
    }

    async fn find_available(&self) -> DomainResult<Vec<ParkingSpot>> {
        let mut spots: Vec<ParkingSpot> = self
            .spots
            .iter()
            .filter(|s| s.is_available())
            .map(|s| s.value().clone())
            .collect();
        spots.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(spots)
    }

    async fn update_status(&self, id: &str, status: SpotStatus) -> DomainResult<()> {
        let mut spot = self
            .spots
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", id))?;
        if spot.is_occupied {
            return Err(DomainError::SpotUnavailable {
                spot_id: id.to_string(),
            });
        }
        spot.status = status;
        spot.last_updated = Utc::now();
        Ok(())
    }
}

// ── Packages ───────────────────────────────────────────────────

#[async_trait]
impl PackageRepository for InMemoryRepositoryProvider {
    async fn save(&self, package: MinutePackage) -> DomainResult<()> {
        self.packages.insert(package.id.clone(), package);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<MinutePackage>> {
        Ok(self.packages.get(id).map(|p| p.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<MinutePackage>> {
        let mut packages: Vec<MinutePackage> =
            self.packages.iter().map(|p| p.value().clone()).collect();
        packages.sort_by_key(|p| p.minutes);
        Ok(packages)
    }

    async fn find_active(&self) -> DomainResult<Vec<MinutePackage>> {
        let mut packages: Vec<MinutePackage> = self
            .packages
            .iter()
            .filter(|p| p.is_active)
            .map(|p| p.value().clone())
            .collect();
        packages.sort_by_key(|p| p.minutes);
        Ok(packages)
    }

    async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<()> {
        let mut package = self
            .packages
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("MinutePackage", "id", id))?;
        package.is_active = is_active;
        package.updated_at = Utc::now();
        Ok(())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.packages.len() as u64)
    }
}

// ── Sessions ───────────────────────────────────────────────────

#[async_trait]
impl SessionRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSession>> {
        Ok(self.sessions.get(id).map(|s| s.clone()))
    }

    async fn find_active_for_user(&self, user_id: &str) -> DomainResult<Option<ParkingSession>> {
        Ok(self
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.is_active())
            .map(|s| s.value().clone()))
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<ParkingSession>> {
        let mut sessions: Vec<ParkingSession> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn find_active(&self) -> DomainResult<Vec<ParkingSession>> {
        let mut sessions: Vec<ParkingSession> = self
            .sessions
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.value().clone())
            .collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(sessions)
    }

    async fn find_by_qr_code(&self, qr_code: &str) -> DomainResult<Option<ParkingSession>> {
        Ok(self
            .sessions
            .iter()
            .find(|s| s.qr_code == qr_code)
            .map(|s| s.value().clone()))
    }
}

// ── Payments ───────────────────────────────────────────────────

#[async_trait]
impl PaymentRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<PaymentTransaction>> {
        Ok(self.payments.get(id).map(|t| t.clone()))
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> DomainResult<Option<PaymentTransaction>> {
        Ok(self
            .payments
            .iter()
            .find(|t| t.metadata.payment_intent_id.as_deref() == Some(payment_intent_id))
            .map(|t| t.value().clone()))
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<PaymentTransaction>> {
        let mut txs: Vec<PaymentTransaction> = self
            .payments
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.value().clone())
            .collect();
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(txs)
    }

    async fn find_pending(&self) -> DomainResult<Vec<PaymentTransaction>> {
        let mut txs: Vec<PaymentTransaction> = self
            .payments
            .iter()
            .filter(|t| t.status.is_pending())
            .map(|t| t.value().clone())
            .collect();
        txs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(txs)
    }
}

// ── Ledger ─────────────────────────────────────────────────────

#[async_trait]
impl Ledger for InMemoryRepositoryProvider {
    async fn open_session(&self, session: &ParkingSession) -> DomainResult<()> {
        let _commit = self.commit.lock().await;
        self.take_injected_failure()?;

        if self
            .sessions
            .iter()
            .any(|s| s.user_id == session.user_id && s.is_active())
        {
            return Err(DomainError::SessionAlreadyActive {
                user_id: session.user_id.clone(),
            });
        }

        if let Some(spot_id) = &session.spot_id {
            let mut spot = self
                .spots
                .get_mut(spot_id)
                .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", spot_id.as_str()))?;
            if !spot.is_available() {
                return Err(DomainError::SpotUnavailable {
                    spot_id: spot_id.clone(),
                });
            }
            spot.occupy(&session.id, session.started_at);
        }

        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn close_session(
        &self,
        session: &ParkingSession,
        debit_minutes: Option<i64>,
    ) -> DomainResult<Option<BalanceDebit>> {
        let _commit = self.commit.lock().await;
        self.take_injected_failure()?;

        let stored_active = self
            .sessions
            .get(&session.id)
            .map(|s| s.is_active())
            .ok_or_else(|| DomainError::not_found("ParkingSession", "id", session.id.as_str()))?;
        if !stored_active {
            return Err(DomainError::SessionNotActive {
                session_id: session.id.clone(),
            });
        }

        let at = session.ended_at().unwrap_or_else(Utc::now);
        let debit = match debit_minutes {
            Some(minutes) => {
                let mut user = self.users.get_mut(&session.user_id).ok_or_else(|| {
                    DomainError::not_found("User", "id", session.user_id.as_str())
                })?;
                let (new_minutes, shortfall_minutes) = user.balance_after_debit(minutes);
                let previous_minutes = user.balance_minutes;
                user.balance_minutes = new_minutes;
                user.updated_at = at;
                Some(BalanceDebit {
                    previous_minutes,
                    new_minutes,
                    shortfall_minutes,
                })
            }
            None => None,
        };

        if let Some(spot_id) = &session.spot_id {
            if let Some(mut spot) = self.spots.get_mut(spot_id) {
                if spot.current_session_id.as_deref() == Some(session.id.as_str()) {
                    spot.release(at);
                }
            }
        }

        self.sessions.insert(session.id.clone(), session.clone());
        Ok(debit)
    }

    async fn record_transaction(&self, tx: &PaymentTransaction) -> DomainResult<()> {
        let _commit = self.commit.lock().await;
        self.take_injected_failure()?;

        if self.payments.contains_key(&tx.id) {
            return Err(DomainError::Conflict(format!("transaction {} already exists", tx.id)));
        }
        if let Some(intent) = &tx.metadata.payment_intent_id {
            let duplicate = self
                .payments
                .iter()
                .any(|t| t.metadata.payment_intent_id.as_ref() == Some(intent));
            if duplicate {
                return Err(DomainError::Conflict(format!("payment intent {} already recorded", intent)));
            }
        }
        if tx.status.is_completed() {
            self.credit(&tx.user_id, tx.credit_minutes())?;
        }
        self.payments.insert(tx.id.clone(), tx.clone());
        Ok(())
    }

    async fn settle_transaction(&self, tx: &PaymentTransaction) -> DomainResult<bool> {
        let _commit = self.commit.lock().await;
        self.take_injected_failure()?;

        let stored_pending = self
            .payments
            .get(&tx.id)
            .map(|t| t.status.is_pending())
            .ok_or_else(|| DomainError::not_found("PaymentTransaction", "id", tx.id.as_str()))?;
        if !stored_pending {
            return Ok(false);
        }
        if tx.status.is_completed() {
            self.credit(&tx.user_id, tx.credit_minutes())?;
        }
        self.payments.insert(tx.id.clone(), tx.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SpotType, UserRole};

    fn user(id: &str, balance: i64) -> User {
        User {
            id: id.into(),
            phone: "+50499887766".into(),
            name: "Ana".into(),
            email: None,
            role: UserRole::Client,
            is_active: true,
            balance_minutes: balance,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn open_session_occupies_spot_and_rejects_second() {
        let repos = InMemoryRepositoryProvider::new();
        repos.users().create(user("u1", 0)).await.unwrap();
        let spot = ParkingSpot::new("A1", "Level 1", SpotType::Regular);
        let spot_id = spot.id.clone();
        repos.spots().save(spot).await.unwrap();

        let s1 = ParkingSession::start("u1", "p", "Ana", "Gate", Some(spot_id.clone()), Utc::now());
        repos.ledger().open_session(&s1).await.unwrap();

        let spot = repos.spots().find_by_id(&spot_id).await.unwrap().unwrap();
        assert!(spot.is_occupied);
        assert_eq!(spot.current_session_id.as_deref(), Some(s1.id.as_str()));

        let s2 = ParkingSession::start("u1", "p", "Ana", "Gate", None, Utc::now());
        let err = repos.ledger().open_session(&s2).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionAlreadyActive { .. }));
    }

    #[tokio::test]
    async fn occupied_spot_status_cannot_be_overwritten() {
        let repos = InMemoryRepositoryProvider::new();
        repos.users().create(user("u1", 0)).await.unwrap();
        let spot = ParkingSpot::new("A1", "Level 1", SpotType::Regular);
        let spot_id = spot.id.clone();
        repos.spots().save(spot).await.unwrap();
        repos.spots().update_status(&spot_id, SpotStatus::Maintenance).await.unwrap();
        repos.spots().update_status(&spot_id, SpotStatus::Available).await.unwrap();

        let session = ParkingSession::start("u1", "p", "Ana", "Gate", Some(spot_id.clone()), Utc::now());
        repos.ledger().open_session(&session).await.unwrap();

        let err = repos
            .spots()
            .update_status(&spot_id, SpotStatus::Maintenance)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SpotUnavailable { .. }));
        let spot = repos.spots().find_by_id(&spot_id).await.unwrap().unwrap();
        assert!(spot.is_occupied);
        assert_eq!(spot.status, SpotStatus::Occupied);
    }

    #[tokio::test]
    async fn settle_is_conditional_on_pending() {
        let repos = InMemoryRepositoryProvider::new();
        let u = user("u1", 0);
        repos.users().create(u.clone()).await.unwrap();
        let package = MinutePackage::new("1h", 60, 5000, "HNL").unwrap();
        let mut tx = PaymentTransaction::card_intent(&u, &package, "pi_1", None, Utc::now());
        repos.ledger().record_transaction(&tx).await.unwrap();

        tx.complete(Utc::now(), None).unwrap();
        assert!(repos.ledger().settle_transaction(&tx).await.unwrap());
        assert!(!repos.ledger().settle_transaction(&tx).await.unwrap());

        let stored = UserRepository::find_by_id(&repos, "u1").await.unwrap().unwrap();
        assert_eq!(stored.balance_minutes, 60);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let repos = InMemoryRepositoryProvider::new();
        repos.fail_next_ledger_writes(1);
        let s = ParkingSession::start("u1", "p", "Ana", "Gate", None, Utc::now());
        assert!(repos.ledger().open_session(&s).await.unwrap_err().is_transient());
        repos.ledger().open_session(&s).await.unwrap();
    }
}
