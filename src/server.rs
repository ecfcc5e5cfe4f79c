//! Reusable parking service runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: database connection,
//! migrations, first-start seeding, the REST API and graceful shutdown.
//! The plain binary and the CLI both start the service through it.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{AccountService, PackageService};
use crate::config::{AppConfig, LogFormat};
use crate::domain::{CreateUserDto, RepositoryProvider, UserRole};
use crate::infrastructure::{init_database, run_migrations, SeaOrmRepositoryProvider};
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::DomainResult;

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the service.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create the admin account and package catalog on an empty database
    /// (default: `config.seed.enabled`).
    pub seed_defaults: bool,
}

impl ServerOptions {
    pub fn new(config: AppConfig) -> Self {
        let seed_defaults = config.seed.enabled;
        Self {
            config,
            auto_migrate: true,
            seed_defaults,
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running service.
///
/// ```rust,no_run
/// use parkhub::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    /// Address the REST API is bound to. Differs from the configured one
    /// when port 0 was requested.
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting parking service...");

        let prometheus_handle = prometheus_handle();

        if let Some(dir) = app_cfg.database.sqlite_dir() {
            std::fs::create_dir_all(&dir)?;
        }
        let db_config = app_cfg.database.to_database_config();
        let db = init_database(&db_config).await?;

        if opts.auto_migrate {
            run_migrations(&db).await?;
        }

        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        if opts.seed_defaults {
            seed_defaults(repos.clone(), &app_cfg).await?;
        }

        let jwt_config = app_cfg.security.jwt_config();
        if app_cfg.security.uses_default_secret() {
            warn!("security.jwt_secret is the built-in default; set a real secret in production");
        }
        info!(
            expiration_hours = jwt_config.expiration_hours,
            issuer = jwt_config.issuer.as_str(),
            "JWT verification configured"
        );

        let rate = app_cfg.billing.rate();
        info!(
            price_per_minute_cents = rate.price_per_minute_cents,
            currency = rate.currency.as_str(),
            "Parking rate"
        );

        let state = ApiState::new(
            repos.clone(),
            rate,
            app_cfg.retry.clone(),
            jwt_config,
            Some(db.clone()),
        );
        let api_router = create_api_router(state, prometheus_handle);

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let listener = tokio::net::TcpListener::bind(app_cfg.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(
            listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            repos,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the API to drain after shutdown was triggered, bounded by
    /// `server.shutdown_timeout`, then close the database.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            ..
        } = self;

        let drained = shutdown
            .shutdown_with_cleanup(|| async move {
                if let Err(e) = api_task.await {
                    error!("REST API server task panicked: {}", e);
                }
            })
            .await;
        if !drained {
            warn!("In-flight requests were abandoned");
        }

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }

        info!("Parking service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down parking service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global recorder can only be installed once per process; later
/// starts in the same process reuse it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Metrics disabled, recorder not installed: {}", e);
                None
            }
        })
        .clone()
}

/// Create the admin account and the package catalog when absent.
pub async fn seed_defaults(repos: Arc<dyn RepositoryProvider>, app_cfg: &AppConfig) -> DomainResult<()> {
    let admin = &app_cfg.seed.admin;
    if repos.users().find_by_phone(&admin.phone).await?.is_none() {
        let user = AccountService::new(repos.clone())
            .register_user(CreateUserDto {
                phone: admin.phone.clone(),
                name: admin.name.clone(),
                email: None,
                role: Some(UserRole::Admin),
                initial_balance_minutes: 0,
            })
            .await?;
        info!(user_id = user.id.as_str(), phone = user.phone.as_str(), "Default admin created");
    }

    let packages = PackageService::new(repos, app_cfg.billing.currency.clone());
    let added = packages.seed_defaults(&app_cfg.seed.package_tuples()).await?;
    if added > 0 {
        info!(count = added, "Default minute packages created");
    }
    Ok(())
}

/// Initialize tracing from the application config. `RUST_LOG` wins over
/// `logging.level`. Call once at process startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::infrastructure::InMemoryRepositoryProvider;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.database.sqlite.path = ":memory:".into();
        config
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let config = AppConfig::default();

        seed_defaults(repos.clone(), &config).await.unwrap();
        seed_defaults(repos.clone(), &config).await.unwrap();

        let admin = repos
            .users()
            .find_by_phone(&config.seed.admin.phone)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(repos.packages().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn serves_health_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions::new(test_config()))
            .await
            .unwrap();
        assert!(handle.is_running());

        let response = get(handle.local_addr, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        assert!(response.contains("\"sqlite\""), "{}", response);

        let packages = get(handle.local_addr, "/api/v1/packages").await;
        assert!(packages.starts_with("HTTP/1.1 401"), "{}", packages);

        handle.shutdown().await;
    }
}
