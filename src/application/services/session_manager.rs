//! Parking session lifecycle
//!
//! Opens, closes and cancels sessions, toggles spot occupancy through the
//! ledger and debits prepaid minutes on balance-mode closes.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::locks::{KeyedLocks, SharedKeyedLocks};
use crate::domain::{
    DomainError, DomainResult, ParkingRate, ParkingSession, PaymentMethod, RepositoryProvider,
    SessionQrCode, UserQrCode,
};
use crate::shared::{
    require_non_empty, retry_with_backoff, system_clock, PaginatedResult, PaginationParams,
    RetryConfig, SharedClock,
};

/// Request to open a session
#[derive(Debug, Clone)]
pub struct StartSession {
    pub user_id: String,
    pub location: String,
    pub spot_id: Option<String>,
}

/// What a guard's scan did
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Started(ParkingSession),
    Ended(ParkingSession),
}

impl ScanOutcome {
    pub fn session(&self) -> &ParkingSession {
        match self {
            Self::Started(s) | Self::Ended(s) => s,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Started(_) => "started",
            Self::Ended(_) => "ended",
        }
    }
}

/// Running bill of an active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostPreview {
    pub session_id: String,
    pub duration_minutes: i64,
    pub cost_cents: i64,
    pub currency: String,
}

pub struct SessionManager {
    repos: Arc<dyn RepositoryProvider>,
    rate: ParkingRate,
    clock: SharedClock,
    locks: SharedKeyedLocks,
    retry: RetryConfig,
}

impl SessionManager {
    pub fn new(repos: Arc<dyn RepositoryProvider>, rate: ParkingRate) -> Self {
        Self {
            repos,
            rate,
            clock: system_clock(),
            locks: KeyedLocks::shared(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Share per-user locks with the payment side so balance writes for one
    /// user never interleave.
    pub fn with_locks(mut self, locks: SharedKeyedLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn rate(&self) -> &ParkingRate {
        &self.rate
    }

    pub async fn start_session(&self, request: StartSession) -> DomainResult<ParkingSession> {
        require_non_empty("user_id", &request.user_id)?;
        require_non_empty("location", &request.location)?;

        let user = self
            .repos
            .users()
            .find_by_id(&request.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", request.user_id.as_str()))?;
        if !user.is_active {
            return Err(DomainError::Forbidden(format!("user {} is deactivated", user.id)));
        }

        let _guard = self.locks.lock(&user.id).await;

        if let Some(active) = self.repos.sessions().find_active_for_user(&user.id).await? {
            warn!(user_id = user.id.as_str(), session_id = active.id.as_str(), "Session already active");
            return Err(DomainError::SessionAlreadyActive { user_id: user.id });
        }

        if let Some(spot_id) = &request.spot_id {
            let spot = self
                .repos
                .spots()
                .find_by_id(spot_id)
                .await?
                .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", spot_id.as_str()))?;
            if !spot.is_available() {
                return Err(DomainError::SpotUnavailable {
                    spot_id: spot.id,
                });
            }
        }

        let session = ParkingSession::start(
            user.id.as_str(),
            user.phone.as_str(),
            user.name.as_str(),
            request.location.trim(),
            request.spot_id.clone(),
            self.clock.now(),
        );

        retry_with_backoff(
            self.retry.clone(),
            || self.repos.ledger().open_session(&session),
            DomainError::is_transient,
            "open_session",
        )
        .await?;

        metrics::counter!("parking_sessions_started_total").increment(1);
        info!(
            session_id = session.id.as_str(),
            user_id = session.user_id.as_str(),
            location = session.location.as_str(),
            spot_id = ?session.spot_id,
            "Parking session started"
        );

        Ok(session)
    }

    /// Close an active session, billing every started minute.
    pub async fn end_session(
        &self,
        session_id: &str,
        guard_id: Option<String>,
        payment_method: PaymentMethod,
    ) -> DomainResult<ParkingSession> {
        let user_id = self.get_session(session_id).await?.user_id;
        let _guard = self.locks.lock(&user_id).await;

        // re-read under the user lock
        let mut session = self.get_session(session_id).await?;
        let bill = session.complete(self.clock.now(), &self.rate, payment_method, guard_id)?;
        let debit_minutes = (payment_method == PaymentMethod::Balance).then_some(bill.duration_minutes);

        let debit = retry_with_backoff(
            self.retry.clone(),
            || self.repos.ledger().close_session(&session, debit_minutes),
            DomainError::is_transient,
            "close_session",
        )
        .await?;

        if let Some(debit) = debit {
            if debit.shortfall_minutes > 0 {
                metrics::counter!("parking_balance_shortfall_minutes_total")
                    .increment(debit.shortfall_minutes as u64);
                warn!(
                    session_id,
                    user_id = user_id.as_str(),
                    balance_before = debit.previous_minutes,
                    charged_minutes = bill.duration_minutes,
                    shortfall_minutes = debit.shortfall_minutes,
                    "Balance did not cover parking time, clamped to zero"
                );
            }
        }

        metrics::counter!("parking_sessions_ended_total", "payment_method" => payment_method.as_str())
            .increment(1);
        metrics::histogram!("parking_session_duration_minutes").record(bill.duration_minutes as f64);
        info!(
            session_id,
            user_id = user_id.as_str(),
            duration_minutes = bill.duration_minutes,
            cost = %self.rate.format(bill.cost_cents),
            payment_method = payment_method.as_str(),
            guard_id = ?bill.guard_id,
            "Parking session ended"
        );

        Ok(session)
    }

    /// Void a session opened by mistake. No charge, spot released.
    pub async fn cancel_session(
        &self,
        session_id: &str,
        reason: Option<String>,
    ) -> DomainResult<ParkingSession> {
        let user_id = self.get_session(session_id).await?.user_id;
        let _guard = self.locks.lock(&user_id).await;

        let mut session = self.get_session(session_id).await?;
        session.cancel(self.clock.now(), reason)?;

        retry_with_backoff(
            self.retry.clone(),
            || self.repos.ledger().close_session(&session, None),
            DomainError::is_transient,
            "cancel_session",
        )
        .await?;

        metrics::counter!("parking_sessions_cancelled_total").increment(1);
        info!(session_id, user_id = user_id.as_str(), "Parking session cancelled");

        Ok(session)
    }

    /// Toggle a user's session from a guard scan of their QR code.
    pub async fn handle_scan(
        &self,
        payload: &str,
        guard_id: &str,
        location: &str,
        spot_id: Option<String>,
    ) -> DomainResult<ScanOutcome> {
        let code: UserQrCode = payload.parse()?;
        let user = self
            .repos
            .users()
            .find_by_phone(&code.phone)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "phone", code.phone.as_str()))?;

        match self.repos.sessions().find_active_for_user(&user.id).await? {
            Some(active) => {
                info!(guard_id, user_id = user.id.as_str(), "Scan closes session");
                let session = self
                    .end_session(&active.id, Some(guard_id.to_string()), PaymentMethod::Balance)
                    .await?;
                Ok(ScanOutcome::Ended(session))
            }
            None => {
                info!(guard_id, user_id = user.id.as_str(), "Scan opens session");
                let session = self
                    .start_session(StartSession {
                        user_id: user.id,
                        location: location.to_string(),
                        spot_id,
                    })
                    .await?;
                Ok(ScanOutcome::Started(session))
            }
        }
    }

    pub async fn get_session(&self, session_id: &str) -> DomainResult<ParkingSession> {
        self.repos
            .sessions()
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSession", "id", session_id))
    }

    pub async fn active_session_for_user(&self, user_id: &str) -> DomainResult<Option<ParkingSession>> {
        self.repos.sessions().find_active_for_user(user_id).await
    }

    pub async fn sessions_for_user(
        &self,
        user_id: &str,
        pagination: PaginationParams,
    ) -> DomainResult<PaginatedResult<ParkingSession>> {
        let sessions = self.repos.sessions().find_by_user(user_id).await?;
        Ok(PaginatedResult::from_vec(sessions, pagination))
    }

    pub async fn active_sessions(&self) -> DomainResult<Vec<ParkingSession>> {
        self.repos.sessions().find_active().await
    }

    pub async fn find_by_qr_code(&self, token: &str) -> DomainResult<ParkingSession> {
        let code: SessionQrCode = token.parse()?;
        let token = code.to_string();
        self.repos
            .sessions()
            .find_by_qr_code(&token)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSession", "qr_code", token))
    }

    /// Duration and cost so far, computed exactly as `end_session` would.
    pub async fn preview_cost(&self, session_id: &str) -> DomainResult<CostPreview> {
        let session = self.get_session(session_id).await?;
        if !session.is_active() {
            return Err(DomainError::SessionNotActive {
                session_id: session.id,
            });
        }
        let (duration_minutes, cost_cents) = session.preview(self.clock.now(), &self.rate);
        Ok(CostPreview {
            session_id: session.id,
            duration_minutes,
            cost_cents,
            currency: self.rate.currency.clone(),
        })
    }
}
