//! # ParkHub
//!
//! Parking session and prepaid-minute billing service.
//!
//! ## Architecture
//!
//! - **domain**: entities, state machines, QR token formats, storage ports
//! - **application**: session and payment managers, catalog services
//! - **infrastructure**: SeaORM persistence, in-memory storage, JWT
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime shared by the binaries

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{config_path_from_env, default_config_path, AppConfig};

pub use infrastructure::{
    init_database, run_migrations, DatabaseConfig, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};

pub use interfaces::http::{create_api_router, ApiDoc, ApiState};

pub use server::{init_tracing, ServerHandle, ServerOptions};
