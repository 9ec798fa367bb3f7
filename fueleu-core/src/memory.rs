//! In-memory store
//!
//! All state sits behind one `RwLock`; each trait method takes the lock once,
//! so read-check-write sequences cannot interleave.

use crate::error::{Error, Result};
use crate::intensity::{adjusted_cb, debit_banked, surplus_to_bank};
use crate::store::{BankStore, ComplianceStore, PoolStore, RouteStore};
use crate::types::{BankEntry, ComplianceBalance, Pool, PoolMember, Route};
use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

type ShipYear = (String, i32);

#[derive(Default)]
struct State {
    routes: BTreeMap<String, Route>,
    compliance: HashMap<ShipYear, ComplianceBalance>,
    banks: HashMap<ShipYear, BankEntry>,
    pools: HashMap<Uuid, Pool>,
}

impl State {
    fn banked(&self, ship_id: &str, year: i32) -> Option<Decimal> {
        self.banks
            .get(&(ship_id.to_string(), year))
            .map(|entry| entry.amount_gco2_eq)
    }

    fn cb(&self, ship_id: &str, year: i32) -> Option<Decimal> {
        self.compliance
            .get(&(ship_id.to_string(), year))
            .map(|balance| balance.cb_gco2_eq)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with `routes`. Later duplicates of a route id win.
    pub fn with_routes(routes: impl IntoIterator<Item = Route>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write();
            for route in routes {
                state.routes.insert(route.route_id.clone(), route);
            }
        }
        store
    }

    /// Store preloaded with the reference routes from [`seed_routes`]
    pub fn seeded() -> Self {
        Self::with_routes(seed_routes())
    }
}

#[async_trait]
impl RouteStore for MemoryStore {
    async fn list_routes(&self) -> Result<Vec<Route>> {
        Ok(self.state.read().routes.values().cloned().collect())
    }

    async fn find_route(&self, route_id: &str) -> Result<Option<Route>> {
        Ok(self.state.read().routes.get(route_id).cloned())
    }

    async fn find_baseline(&self) -> Result<Option<Route>> {
        Ok(self
            .state
            .read()
            .routes
            .values()
            .find(|route| route.is_baseline)
            .cloned())
    }

    async fn set_baseline(&self, route_id: &str) -> Result<Route> {
        let mut state = self.state.write();

        if !state.routes.contains_key(route_id) {
            return Err(Error::RouteNotFound(route_id.to_string()));
        }

        for route in state.routes.values_mut() {
            route.is_baseline = route.route_id == route_id;
        }

        state
            .routes
            .get(route_id)
            .cloned()
            .ok_or_else(|| Error::RouteNotFound(route_id.to_string()))
    }
}

#[async_trait]
impl ComplianceStore for MemoryStore {
    async fn find_compliance(
        &self,
        ship_id: &str,
        year: i32,
    ) -> Result<Option<ComplianceBalance>> {
        Ok(self
            .state
            .read()
            .compliance
            .get(&(ship_id.to_string(), year))
            .cloned())
    }

    async fn save_compliance(&self, balance: &ComplianceBalance) -> Result<ComplianceBalance> {
        let mut state = self.state.write();
        let stored = state
            .compliance
            .entry((balance.ship_id.clone(), balance.year))
            .and_modify(|existing| existing.cb_gco2_eq = balance.cb_gco2_eq)
            .or_insert_with(|| balance.clone());
        Ok(stored.clone())
    }
}

#[async_trait]
impl BankStore for MemoryStore {
    async fn find_bank_entry(&self, ship_id: &str, year: i32) -> Result<Option<BankEntry>> {
        Ok(self
            .state
            .read()
            .banks
            .get(&(ship_id.to_string(), year))
            .cloned())
    }

    async fn bank_surplus(&self, ship_id: &str, year: i32) -> Result<BankEntry> {
        let mut state = self.state.write();
        let key = (ship_id.to_string(), year);

        let surplus = surplus_to_bank(state.compliance.get(&key), ship_id, year)?;

        let entry = state
            .banks
            .entry(key)
            .and_modify(|entry| entry.amount_gco2_eq = surplus)
            .or_insert_with(|| BankEntry {
                id: Uuid::new_v4(),
                ship_id: ship_id.to_string(),
                year,
                amount_gco2_eq: surplus,
            });

        debug!("Banked {} for {} in {}", surplus, ship_id, year);
        Ok(entry.clone())
    }

    async fn apply_banked(&self, ship_id: &str, year: i32, amount: Decimal) -> Result<BankEntry> {
        let mut state = self.state.write();

        let remaining = debit_banked(state.banked(ship_id, year), amount)?;

        match state.banks.get_mut(&(ship_id.to_string(), year)) {
            Some(entry) => {
                entry.amount_gco2_eq = remaining;
                Ok(entry.clone())
            }
            None => Err(Error::InsufficientBanked {
                available: Decimal::ZERO,
                requested: amount,
            }),
        }
    }
}

#[async_trait]
impl PoolStore for MemoryStore {
    async fn create_pool(&self, year: i32, ship_ids: &[String]) -> Result<Pool> {
        let mut state = self.state.write();

        let members = ship_ids
            .iter()
            .map(|ship_id| {
                let cb = adjusted_cb(state.cb(ship_id, year), state.banked(ship_id, year));
                PoolMember::snapshot(ship_id.clone(), cb)
            })
            .collect();

        let pool = Pool::new(year, members);
        state.pools.insert(pool.id, pool.clone());
        Ok(pool)
    }

    async fn find_pool(&self, id: Uuid) -> Result<Option<Pool>> {
        Ok(self.state.read().pools.get(&id).cloned())
    }
}

/// Reference routes used to seed demo and test stores; R001 is the baseline
pub fn seed_routes() -> Vec<Route> {
    let rows = [
        ("R001", "Container", "HFO", 2024, dec!(91.0), dec!(5000), dec!(12000), dec!(4500), true),
        ("R002", "BulkCarrier", "LNG", 2024, dec!(88.0), dec!(4800), dec!(11500), dec!(4200), false),
        ("R003", "Tanker", "MGO", 2024, dec!(93.5), dec!(5100), dec!(12500), dec!(4700), false),
        ("R004", "RoRo", "HFO", 2025, dec!(89.2), dec!(4900), dec!(11800), dec!(4300), false),
        ("R005", "Container", "LNG", 2025, dec!(90.5), dec!(4950), dec!(11900), dec!(4400), false),
    ];

    rows.into_iter()
        .map(
            |(route_id, vessel, fuel, year, ghg, consumption, distance, emissions, baseline)| Route {
                id: Uuid::new_v4(),
                route_id: route_id.to_string(),
                vessel_type: vessel.to_string(),
                fuel_type: fuel.to_string(),
                year,
                ghg_intensity: ghg,
                fuel_consumption: consumption,
                distance,
                total_emissions: emissions,
                is_baseline: baseline,
            },
        )
        .collect()
}
