//! ParkHub CLI server
//!
//! Headless parking session and billing service suitable for deployment
//! as a systemd service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/parkhub/config.toml)
//! parkhub
//!
//! # Custom config path and port
//! parkhub --config /etc/parkhub/config.toml --api-port 8080
//!
//! # Validate config without starting
//! parkhub --check
//!
//! # Write the effective configuration to the config path
//! parkhub --init-config
//!
//! # Mint a bearer token for an existing user (by phone)
//! parkhub --issue-token +50400000000
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use parkhub::config::AppConfig;
use parkhub::domain::RepositoryProvider;
use parkhub::infrastructure::crypto::create_token;
use parkhub::server::{init_tracing, ServerHandle, ServerOptions};
use parkhub::{init_database, SeaOrmRepositoryProvider};

/// ParkHub: parking sessions, prepaid minutes and package purchases.
#[derive(Parser, Debug)]
#[command(
    name = "parkhub",
    version,
    about = "Parking session and billing service",
    long_about = "ParkHub REST API server for parking sessions, spot occupancy \
                  and prepaid minute packages.\n\n\
                  Default config: ~/.config/parkhub/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,

    /// Print a bearer token for the user with this phone number and exit.
    #[arg(long, value_name = "PHONE")]
    issue_token: Option<String>,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip creating the default admin and package catalog.
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(parkhub::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            if cli.check {
                return Err(e.into());
            }
            error!("Using default configuration.");
        }
    }

    // ── One-shot modes ─────────────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Database    : {}", config.database.to_database_config().backend());
        println!(
            "   Rate        : {} cents/min ({})",
            config.billing.price_per_minute_cents, config.billing.currency
        );
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    if cli.init_config {
        config.save(&config_path)?;
        println!("Configuration written to {}", config_path.display());
        return Ok(());
    }

    if let Some(phone) = cli.issue_token {
        let db = init_database(&config.database.to_database_config()).await?;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let user = repos
            .users()
            .find_by_phone(&phone)
            .await?
            .ok_or_else(|| format!("no user with phone {}", phone))?;
        let token = create_token(&user.id, &user.name, user.role, &config.security.jwt_config())?;
        db.close().await?;
        println!("{}", token);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        seed_defaults: !cli.no_seed,
    })
    .await?;

    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
