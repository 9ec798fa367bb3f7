//! Domain records shared by every store and the HTTP layer.
//!
//! JSON field names are camelCase and quantities serialize as plain numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shipping route with its fuel and GHG-intensity metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub route_id: String,
    pub vessel_type: String,
    pub fuel_type: String,
    pub year: i32,
    /// gCO2e/MJ
    #[serde(with = "rust_decimal::serde::float")]
    pub ghg_intensity: Decimal,
    /// tonnes of fuel
    #[serde(with = "rust_decimal::serde::float")]
    pub fuel_consumption: Decimal,
    /// km
    #[serde(with = "rust_decimal::serde::float")]
    pub distance: Decimal,
    /// tonnes CO2e
    #[serde(with = "rust_decimal::serde::float")]
    pub total_emissions: Decimal,
    pub is_baseline: bool,
}

/// Signed compliance balance of a ship for one reporting year.
/// Positive is a surplus, negative a deficit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceBalance {
    pub id: Uuid,
    pub ship_id: String,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub cb_gco2_eq: Decimal,
}

impl ComplianceBalance {
    pub fn new(ship_id: impl Into<String>, year: i32, cb_gco2_eq: Decimal) -> Self {
        ComplianceBalance {
            id: Uuid::new_v4(),
            ship_id: ship_id.into(),
            year,
            cb_gco2_eq,
        }
    }

    pub fn is_surplus(&self) -> bool {
        self.cb_gco2_eq > Decimal::ZERO
    }
}

/// Banked surplus for a ship-year (Article 20)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BankEntry {
    pub id: Uuid,
    pub ship_id: String,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_gco2_eq: Decimal,
}

/// Snapshot of one ship's balance inside a pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolMember {
    pub ship_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cb_before: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cb_after: Decimal,
}

impl PoolMember {
    /// Records a member without redistribution: the after-value mirrors the
    /// before-value.
    pub fn snapshot(ship_id: impl Into<String>, adjusted_cb: Decimal) -> Self {
        PoolMember {
            ship_id: ship_id.into(),
            cb_before: adjusted_cb,
            cb_after: adjusted_cb,
        }
    }
}

/// A group of ship balances pooled for one year (Article 21).
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: Uuid,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub members: Vec<PoolMember>,
}

impl Pool {
    pub fn new(year: i32, members: Vec<PoolMember>) -> Self {
        Pool {
            id: Uuid::new_v4(),
            year,
            created_at: Utc::now(),
            members,
        }
    }

    /// Sum of the members' balances before pooling
    pub fn total_cb_before(&self) -> Decimal {
        self.members.iter().map(|m| m.cb_before).sum()
    }
}

/// One row of the baseline comparison
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub route_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub baseline_ghg_intensity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub comparison_ghg_intensity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_diff: Decimal,
    pub compliant: bool,
}

/// Compliance balance net of banked surplus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedCb {
    pub ship_id: String,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub adjusted_cb: Decimal,
}
