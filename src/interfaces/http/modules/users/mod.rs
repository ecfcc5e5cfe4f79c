//! Users module: registration, lookup and activation

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
