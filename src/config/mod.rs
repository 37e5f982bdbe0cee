/// Application settings from environment variables
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Built-in status catalog and optional catalog file loading
pub mod statuses;

pub use app::{AppConfig, CorsOrigins};
pub use statuses::DEFAULT_STATUS;
