//! Minute package aggregate

pub mod model;
pub mod repository;

pub use model::MinutePackage;
pub use repository::PackageRepository;
