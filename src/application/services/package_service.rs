//! Minute package catalog

use std::sync::Arc;

use tracing::info;

use crate::domain::{DomainError, DomainResult, MinutePackage, RepositoryProvider};

pub struct PackageService {
    repos: Arc<dyn RepositoryProvider>,
    currency: String,
}

impl PackageService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, currency: impl Into<String>) -> Self {
        Self {
            repos,
            currency: currency.into(),
        }
    }

    pub async fn create_package(
        &self,
        name: &str,
        minutes: i64,
        price_cents: i64,
        currency: Option<String>,
    ) -> DomainResult<MinutePackage> {
        let package = MinutePackage::new(
            name.trim(),
            minutes,
            price_cents,
            currency.unwrap_or_else(|| self.currency.clone()),
        )?;
        self.repos.packages().save(package.clone()).await?;

        info!(
            package_id = package.id.as_str(),
            minutes,
            price = %package.format_price(),
            "Minute package created"
        );
        Ok(package)
    }

    pub async fn get_package(&self, package_id: &str) -> DomainResult<MinutePackage> {
        self.repos
            .packages()
            .find_by_id(package_id)
            .await?
            .ok_or_else(|| DomainError::not_found("MinutePackage", "id", package_id))
    }

    /// Purchasable packages, smallest first
    pub async fn list_active(&self) -> DomainResult<Vec<MinutePackage>> {
        self.repos.packages().find_active().await
    }

    pub async fn list_all(&self) -> DomainResult<Vec<MinutePackage>> {
        self.repos.packages().find_all().await
    }

    /// Withdraw a package from sale. Past transactions keep referencing it.
    pub async fn deactivate(&self, package_id: &str) -> DomainResult<MinutePackage> {
        let mut package = self.get_package(package_id).await?;
        self.repos.packages().set_active(package_id, false).await?;
        package.is_active = false;
        info!(package_id, "Minute package deactivated");
        Ok(package)
    }

    /// Create `defaults` when the catalog is empty. Returns how many were added.
    pub async fn seed_defaults(&self, defaults: &[(String, i64, i64)]) -> DomainResult<usize> {
        if self.repos.packages().count().await? > 0 {
            return Ok(0);
        }
        for (name, minutes, price_cents) in defaults {
            self.create_package(name, *minutes, *price_cents, None).await?;
        }
        Ok(defaults.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service() -> PackageService {
        PackageService::new(Arc::new(InMemoryRepositoryProvider::new()), "HNL")
    }

    #[tokio::test]
    async fn deactivated_package_leaves_active_list() {
        let svc = service();
        let hour = svc.create_package("1 hour", 60, 5000, None).await.unwrap();
        svc.create_package("30 min", 30, 3000, None).await.unwrap();
        assert_eq!(hour.currency, "HNL");

        svc.deactivate(&hour.id).await.unwrap();
        let active = svc.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].minutes, 30);
        assert_eq!(svc.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_package_rejected() {
        let svc = service();
        assert!(svc.create_package("free", 0, 0, None).await.is_err());
        assert!(svc.deactivate("missing").await.is_err());
    }

    #[tokio::test]
    async fn seeding_runs_once() {
        let svc = service();
        let defaults = vec![("1 hour".to_string(), 60, 5000), ("2 hours".to_string(), 120, 9000)];
        assert_eq!(svc.seed_defaults(&defaults).await.unwrap(), 2);
        assert_eq!(svc.seed_defaults(&defaults).await.unwrap(), 0);
        assert_eq!(svc.list_active().await.unwrap().len(), 2);
    }
}
