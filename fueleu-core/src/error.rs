//! Error types for compliance operations

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for compliance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Compliance errors
#[derive(Error, Debug)]
pub enum Error {
    /// Comparison requested while no route carries the baseline flag
    #[error("No baseline route found")]
    NoBaseline,

    /// Baseline intensity of zero makes percent difference undefined
    #[error("Baseline route {0} has zero GHG intensity")]
    ZeroBaselineIntensity(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    /// No route to derive a compliance balance from
    #[error("No route found for ship {ship_id} in {year}")]
    NoRouteForShip { ship_id: String, year: i32 },

    #[error("No compliance balance found for ship {ship_id} in {year}")]
    ComplianceNotFound { ship_id: String, year: i32 },

    #[error("No surplus to bank: compliance balance is {0}")]
    NoSurplus(Decimal),

    #[error("Insufficient banked amount. Available: {available}, Requested: {requested}")]
    InsufficientBanked { available: Decimal, requested: Decimal },

    #[error("Pool not found: {0}")]
    PoolNotFound(uuid::Uuid),

    /// Rejected input, message is safe to show to clients
    #[error("{0}")]
    Validation(&'static str),

    /// Datastore failure, message passed through as is
    #[error("{0}")]
    Storage(String),
}

impl Error {
    /// Short label used for metrics and the error body
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::NoBaseline => "no_baseline",
            Error::ZeroBaselineIntensity(_) => "invalid_baseline",
            Error::RouteNotFound(_) => "route_not_found",
            Error::NoRouteForShip { .. } => "route_not_found",
            Error::ComplianceNotFound { .. } => "compliance_not_found",
            Error::NoSurplus(_) => "no_surplus",
            Error::InsufficientBanked { .. } => "insufficient_banked",
            Error::PoolNotFound(_) => "pool_not_found",
            Error::Validation(_) => "validation_error",
            Error::Storage(_) => "storage_error",
        }
    }
}
