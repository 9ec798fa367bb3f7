//! Compliance arithmetic
//!
//! Pure functions over routes and balances. Stores call into these inside
//! their own atomic units, so every check here runs against the values that
//! are about to be written.
//!
//! # Formulas
//!
//! - percent diff: `(route / baseline - 1) * 100`
//! - compliance balance: `(target - actual) * fuel_t * 41 000 MJ/t`
//! - adjusted balance: `cb - banked`, or 0 without a compliance record

use crate::error::{Error, Result};
use crate::types::{ComplianceBalance, Comparison, Route};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// FuelEU target GHG intensity for 2025-2029 (gCO2e/MJ), 2% below 91.16
pub const TARGET_INTENSITY: Decimal = dec!(89.3368);

/// Lower calorific value used to convert fuel mass to energy (MJ/t)
pub const ENERGY_PER_TONNE_MJ: Decimal = dec!(41000);

/// Regulatory parameters the arithmetic runs against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityParams {
    pub target_intensity: Decimal,
    pub energy_per_tonne_mj: Decimal,
}

impl Default for IntensityParams {
    fn default() -> Self {
        IntensityParams {
            target_intensity: TARGET_INTENSITY,
            energy_per_tonne_mj: ENERGY_PER_TONNE_MJ,
        }
    }
}

/// Percent difference of `intensity` against `baseline`.
/// `None` when the baseline is zero or the result overflows.
pub fn percent_diff(intensity: Decimal, baseline: Decimal) -> Option<Decimal> {
    let ratio = intensity.checked_div(baseline)?;
    (ratio - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED)
}

pub fn is_compliant(intensity: Decimal, target: Decimal) -> bool {
    intensity <= target
}

/// Compares every route except the baseline itself against the baseline
pub fn compare_routes(
    routes: &[Route],
    baseline: &Route,
    params: &IntensityParams,
) -> Result<Vec<Comparison>> {
    routes
        .iter()
        .filter(|route| route.route_id != baseline.route_id)
        .map(|route| {
            let diff = percent_diff(route.ghg_intensity, baseline.ghg_intensity)
                .ok_or_else(|| Error::ZeroBaselineIntensity(baseline.route_id.clone()))?;

            Ok(Comparison {
                route_id: route.route_id.clone(),
                baseline_ghg_intensity: baseline.ghg_intensity,
                comparison_ghg_intensity: route.ghg_intensity,
                percent_diff: diff,
                compliant: is_compliant(route.ghg_intensity, params.target_intensity),
            })
        })
        .collect()
}

/// Energy in scope for a route (MJ)
pub fn energy_in_scope(route: &Route, params: &IntensityParams) -> Decimal {
    route.fuel_consumption * params.energy_per_tonne_mj
}

/// Compliance balance (gCO2e) a route earns against the target.
/// Trailing zeros are stripped so the value reads the same in messages.
pub fn compliance_balance(route: &Route, params: &IntensityParams) -> Decimal {
    ((params.target_intensity - route.ghg_intensity) * energy_in_scope(route, params)).normalize()
}

/// Balance net of banked surplus. A ship-year without a compliance record
/// counts as zero regardless of what is banked.
pub fn adjusted_cb(cb: Option<Decimal>, banked: Option<Decimal>) -> Decimal {
    match cb {
        Some(cb) => cb - banked.unwrap_or(Decimal::ZERO),
        None => Decimal::ZERO,
    }
}

/// Amount that banking would record for this balance: the whole surplus
pub fn surplus_to_bank(
    compliance: Option<&ComplianceBalance>,
    ship_id: &str,
    year: i32,
) -> Result<Decimal> {
    let compliance = compliance.ok_or_else(|| Error::ComplianceNotFound {
        ship_id: ship_id.to_string(),
        year,
    })?;

    if !compliance.is_surplus() {
        return Err(Error::NoSurplus(compliance.cb_gco2_eq.normalize()));
    }

    Ok(compliance.cb_gco2_eq)
}

/// Remaining banked amount after debiting `requested`.
/// A missing entry has nothing available.
pub fn debit_banked(available: Option<Decimal>, requested: Decimal) -> Result<Decimal> {
    let available = available.unwrap_or(Decimal::ZERO);
    if requested > available {
        return Err(Error::InsufficientBanked {
            available: available.normalize(),
            requested: requested.normalize(),
        });
    }
    Ok(available - requested)
}
