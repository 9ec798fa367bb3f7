//! FuelEU compliance core
//!
//! Route comparison, compliance balances, banking and pooling for maritime
//! GHG-intensity tracking.
//!
//! # Architecture
//!
//! - **Arithmetic** ([`intensity`]): pure functions, no I/O
//! - **Ports** ([`store`]): async traits, one method per atomic unit
//! - **Use cases** ([`service`]): orchestrate stores and arithmetic
//!
//! # Invariants
//!
//! - At most one route is the baseline
//! - Banked amounts never go negative
//! - Pools are immutable once created

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod intensity;
pub mod memory;
pub mod service;
pub mod store;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use intensity::{IntensityParams, ENERGY_PER_TONNE_MJ, TARGET_INTENSITY};
pub use memory::MemoryStore;
pub use service::ComplianceService;
pub use store::{BankStore, ComplianceStore, PoolStore, RouteStore, Store};
pub use types::{AdjustedCb, BankEntry, ComplianceBalance, Comparison, Pool, PoolMember, Route};
