//! Compliance use cases
//!
//! `ComplianceService` is what the HTTP layer talks to. It owns no state
//! besides the store handle and the regulatory parameters.

use crate::error::{Error, Result};
use crate::intensity::{self, IntensityParams};
use crate::store::Store;
use crate::types::{AdjustedCb, BankEntry, ComplianceBalance, Comparison, Pool, Route};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ComplianceService {
    store: Arc<dyn Store>,
    params: IntensityParams,
}

impl ComplianceService {
    pub fn new(store: Arc<dyn Store>, params: IntensityParams) -> Self {
        ComplianceService { store, params }
    }

    pub fn params(&self) -> &IntensityParams {
        &self.params
    }

    pub async fn get_routes(&self) -> Result<Vec<Route>> {
        self.store.list_routes().await
    }

    pub async fn get_route(&self, route_id: &str) -> Result<Route> {
        self.store
            .find_route(route_id)
            .await?
            .ok_or_else(|| Error::RouteNotFound(route_id.to_string()))
    }

    pub async fn set_baseline(&self, route_id: &str) -> Result<Route> {
        let route = self.store.set_baseline(route_id).await?;
        info!("Baseline route set to {}", route.route_id);
        Ok(route)
    }

    /// Compares all non-baseline routes against the current baseline
    pub async fn compare_routes(&self) -> Result<Vec<Comparison>> {
        let baseline = self.store.find_baseline().await?.ok_or(Error::NoBaseline)?;
        let routes = self.store.list_routes().await?;

        intensity::compare_routes(&routes, &baseline, &self.params)
    }

    /// Returns the stored balance, or derives it from the ship's route for
    /// that year and persists it.
    pub async fn get_compliance_balance(&self, ship_id: &str, year: i32) -> Result<ComplianceBalance> {
        if let Some(existing) = self.store.find_compliance(ship_id, year).await? {
            return Ok(existing);
        }

        let route = self
            .store
            .find_route(ship_id)
            .await?
            .filter(|route| route.year == year)
            .ok_or_else(|| Error::NoRouteForShip {
                ship_id: ship_id.to_string(),
                year,
            })?;

        let cb = intensity::compliance_balance(&route, &self.params);
        let saved = self
            .store
            .save_compliance(&ComplianceBalance::new(ship_id, year, cb))
            .await?;

        info!("Computed compliance balance {} for {} in {}", cb, ship_id, year);
        Ok(saved)
    }

    pub async fn get_adjusted_cb(&self, ship_id: &str, year: i32) -> Result<AdjustedCb> {
        let cb = self
            .store
            .find_compliance(ship_id, year)
            .await?
            .map(|balance| balance.cb_gco2_eq);

        let banked = match cb {
            Some(_) => self
                .store
                .find_bank_entry(ship_id, year)
                .await?
                .map(|entry| entry.amount_gco2_eq),
            None => None,
        };

        Ok(AdjustedCb {
            ship_id: ship_id.to_string(),
            year,
            adjusted_cb: intensity::adjusted_cb(cb, banked),
        })
    }

    /// Banks the full surplus of a ship-year, replacing any earlier amount
    pub async fn bank_surplus(&self, ship_id: &str, year: i32) -> Result<BankEntry> {
        match self.store.bank_surplus(ship_id, year).await {
            Ok(entry) => {
                info!(
                    "Banked {} gCO2e for {} in {}",
                    entry.amount_gco2_eq, ship_id, year
                );
                Ok(entry)
            }
            Err(e) => {
                warn!("Banking rejected for {} in {}: {}", ship_id, year, e);
                Err(e)
            }
        }
    }

    pub async fn apply_banked(&self, ship_id: &str, year: i32, amount: Decimal) -> Result<BankEntry> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation("amount must be greater than zero"));
        }

        match self.store.apply_banked(ship_id, year, amount).await {
            Ok(entry) => {
                info!(
                    "Applied {} banked gCO2e for {} in {}, {} remaining",
                    amount, ship_id, year, entry.amount_gco2_eq
                );
                Ok(entry)
            }
            Err(e) => {
                warn!("Apply rejected for {} in {}: {}", ship_id, year, e);
                Err(e)
            }
        }
    }

    /// Snapshots the adjusted balance of each ship into a new pool.
    /// Repeated ship ids are collapsed, keeping the first occurrence.
    pub async fn create_pool(&self, year: i32, ship_ids: &[String]) -> Result<Pool> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = ship_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return Err(Error::Validation("year and shipIds array are required"));
        }

        let pool = self.store.create_pool(year, &unique).await?;
        let total = pool.total_cb_before();
        if total < Decimal::ZERO {
            // accepted anyway; only the dashboard gates on a negative sum
            warn!("Pool {} for {} has negative total balance {}", pool.id, year, total);
        }

        info!(
            "Created pool {} for {} with {} members",
            pool.id,
            year,
            pool.members.len()
        );
        Ok(pool)
    }

    pub async fn get_pool(&self, id: Uuid) -> Result<Pool> {
        self.store
            .find_pool(id)
            .await?
            .ok_or(Error::PoolNotFound(id))
    }
}
