//! Parking service
//!
//! Reads configuration from TOML (`~/.config/parkhub/config.toml`, or the
//! file named by `PARKHUB_CONFIG`) and serves the REST API until SIGINT or
//! SIGTERM.

use tracing::{error, info};

use parkhub::{config_path_from_env, init_tracing, AppConfig, ServerHandle, ServerOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path_from_env();
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg);
            error!("Failed to load config: {}. Using defaults.", e);
            cfg
        }
    };

    let handle = ServerHandle::start(ServerOptions::new(app_cfg)).await?;
    handle.install_signal_handler();
    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}
