//! Repository traits for the domain layer
//!
//! `RepositoryProvider` gives unified access to all per-aggregate
//! repositories and the ledger. Consumers request only what they need:
//!
//! ```ignore
//! async fn handle(repos: &dyn RepositoryProvider) {
//!     let user = repos.users().find_by_id("u1").await?;
//!     let active = repos.sessions().find_active_for_user("u1").await?;
//! }
//! ```

use super::ledger::Ledger;
use super::package::PackageRepository;
use super::payment::PaymentRepository;
use super::session::SessionRepository;
use super::spot::SpotRepository;
use super::user::UserRepository;

pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn spots(&self) -> &dyn SpotRepository;
    fn packages(&self) -> &dyn PackageRepository;
    fn sessions(&self) -> &dyn SessionRepository;
    fn payments(&self) -> &dyn PaymentRepository;
    fn ledger(&self) -> &dyn Ledger;
}
