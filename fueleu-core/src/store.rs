//! Storage ports
//!
//! Every operation that reads, checks and writes is a single trait method so
//! that each backend can run it as one atomic unit (a transaction, a
//! conditional update or a held lock). Backends call the checks in
//! [`crate::intensity`] from inside that unit.

use crate::error::Result;
use crate::types::{BankEntry, ComplianceBalance, Pool, Route};
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

#[async_trait]
pub trait RouteStore: Send + Sync {
    /// All routes ordered by route id
    async fn list_routes(&self) -> Result<Vec<Route>>;

    async fn find_route(&self, route_id: &str) -> Result<Option<Route>>;

    async fn find_baseline(&self) -> Result<Option<Route>>;

    /// Makes `route_id` the only baseline. Fails with `RouteNotFound` and
    /// leaves the current baseline in place when the route does not exist.
    async fn set_baseline(&self, route_id: &str) -> Result<Route>;
}

#[async_trait]
pub trait ComplianceStore: Send + Sync {
    async fn find_compliance(&self, ship_id: &str, year: i32)
        -> Result<Option<ComplianceBalance>>;

    /// Upsert keyed on (ship, year). Returns the stored record, whose id is
    /// the existing one on update.
    async fn save_compliance(&self, balance: &ComplianceBalance) -> Result<ComplianceBalance>;
}

#[async_trait]
pub trait BankStore: Send + Sync {
    async fn find_bank_entry(&self, ship_id: &str, year: i32) -> Result<Option<BankEntry>>;

    /// Records the full positive compliance balance as banked, replacing any
    /// previous amount.
    async fn bank_surplus(&self, ship_id: &str, year: i32) -> Result<BankEntry>;

    /// Debits `amount` from the entry if enough is available. On failure the
    /// entry is unchanged.
    async fn apply_banked(&self, ship_id: &str, year: i32, amount: Decimal) -> Result<BankEntry>;
}

#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Snapshots each ship's adjusted balance and persists the pool.
    /// `ship_ids` is expected to be free of duplicates.
    async fn create_pool(&self, year: i32, ship_ids: &[String]) -> Result<Pool>;

    async fn find_pool(&self, id: Uuid) -> Result<Option<Pool>>;
}

/// Everything the compliance service needs from a backend
pub trait Store: RouteStore + ComplianceStore + BankStore + PoolStore {}

impl<T> Store for T where T: RouteStore + ComplianceStore + BankStore + PoolStore {}
