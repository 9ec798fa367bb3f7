use config::{ConfigError, Environment, File};
use fueleu_core::IntensityParams;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub compliance: ComplianceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Seeded in-process store, state is lost on restart
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ComplianceConfig {
    pub target_intensity: String,    // gCO2e/MJ
    pub energy_per_tonne_mj: String, // lower calorific value, MJ/t
}

impl ComplianceConfig {
    pub fn params(&self) -> Result<IntensityParams, String> {
        let target_intensity = Decimal::from_str(&self.target_intensity)
            .map_err(|e| format!("Invalid target intensity '{}': {}", self.target_intensity, e))?;
        let energy_per_tonne_mj = Decimal::from_str(&self.energy_per_tonne_mj).map_err(|e| {
            format!(
                "Invalid energy per tonne '{}': {}",
                self.energy_per_tonne_mj, e
            )
        })?;

        Ok(IntensityParams {
            target_intensity,
            energy_per_tonne_mj,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .set_default("server.workers", 4)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.run_migrations", true)?
            .set_default("storage.backend", "postgres")?
            .set_default("compliance.target_intensity", "89.3368")?
            .set_default("compliance.energy_per_tonne_mj", "41000")?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("FUELEU_ENGINE")
                .separator("__")
                .list_separator(","),
        );

        if let Ok(db_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", db_url)?;
        }

        if let Ok(port) = env::var("FUELEU_ENGINE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.workers == 0 {
            return Err("At least one worker is required".to_string());
        }

        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err("Database URL is required for the postgres backend".to_string());
        }

        let params = self.compliance.params()?;
        if params.target_intensity <= Decimal::ZERO {
            return Err("Target intensity must be positive".to_string());
        }
        if params.energy_per_tonne_mj <= Decimal::ZERO {
            return Err("Energy per tonne must be positive".to_string());
        }

        Ok(())
    }
}
