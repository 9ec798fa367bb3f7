// FuelEU Engine Library
// HTTP transport and PostgreSQL storage for the compliance core

pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;

// Re-exports
pub use config::Config;
pub use errors::{EngineError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVICE_NAME: &str = "fueleu-engine";
