//! Sessions module: start, end, cancel, scan and lookups

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
