//! Request payloads
//!
//! Every field is optional at the serde level so that a missing field
//! surfaces as a 400 with a fixed message rather than a deserializer error.

use crate::errors::{EngineError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

pub const SHIP_YEAR_REQUIRED: &str = "shipId and year are required";
pub const APPLY_FIELDS_REQUIRED: &str = "shipId, year, and amount are required";
pub const POOL_FIELDS_REQUIRED: &str = "year and shipIds array are required";

/// Ship-year pair, as the `?shipId=..&year=..` query of the compliance
/// endpoints and as the body of `POST /banking/bank`
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShipYear {
    #[validate(required, length(min = 1))]
    pub ship_id: Option<String>,
    #[validate(required, range(min = 1))]
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<i32>,
}

impl ShipYear {
    pub fn into_parts(self) -> Result<(String, i32)> {
        self.validate()
            .map_err(|_| EngineError::Validation(SHIP_YEAR_REQUIRED))?;

        match (self.ship_id, self.year) {
            (Some(ship_id), Some(year)) => Ok((ship_id, year)),
            _ => Err(EngineError::Validation(SHIP_YEAR_REQUIRED)),
        }
    }
}

/// Body of `POST /banking/apply`
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyBankedRequest {
    #[validate(required, length(min = 1))]
    pub ship_id: Option<String>,
    #[validate(required, range(min = 1))]
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<i32>,
    #[validate(required, custom = "validate_positive_amount")]
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
}

impl ApplyBankedRequest {
    pub fn into_parts(self) -> Result<(String, i32, Decimal)> {
        self.validate()
            .map_err(|_| EngineError::Validation(APPLY_FIELDS_REQUIRED))?;

        match (self.ship_id, self.year, self.amount) {
            (Some(ship_id), Some(year), Some(amount)) => Ok((ship_id, year, amount)),
            _ => Err(EngineError::Validation(APPLY_FIELDS_REQUIRED)),
        }
    }
}

/// Body of `POST /pools`
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    #[validate(required, range(min = 1))]
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<i32>,
    #[validate(required, length(min = 1))]
    pub ship_ids: Option<Vec<String>>,
}

impl CreatePoolRequest {
    pub fn into_parts(self) -> Result<(i32, Vec<String>)> {
        self.validate()
            .map_err(|_| EngineError::Validation(POOL_FIELDS_REQUIRED))?;

        match (self.year, self.ship_ids) {
            (Some(year), Some(ship_ids)) if ship_ids.iter().all(|id| !id.is_empty()) => {
                Ok((year, ship_ids))
            }
            _ => Err(EngineError::Validation(POOL_FIELDS_REQUIRED)),
        }
    }
}

/// Accepts `2024` or `"2024"`. Text that is not an integer counts as missing.
fn deserialize_year<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Number(i32),
        Text(String),
    }

    Ok(match Option::<Year>::deserialize(deserializer)? {
        Some(Year::Number(year)) => Some(year),
        Some(Year::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

fn validate_positive_amount(amount: &Decimal) -> std::result::Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_not_positive"));
    }
    Ok(())
}
