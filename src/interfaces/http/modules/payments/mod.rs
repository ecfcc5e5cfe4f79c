//! Payments module: purchases, confirmations, card intents and refunds

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
