//! Liveness and storage check

pub mod handlers;

pub use handlers::*;
