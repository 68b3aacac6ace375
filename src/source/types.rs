//! Observation types and typed price extraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single price for an asset class at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Asset class (e.g., "watch")
    pub asset_type: String,
    /// When the listing was ingested
    pub timestamp: DateTime<Utc>,
    /// Listing price, finite and positive
    pub price: f64,
}

/// A raw scraped listing as stored in the warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub asset_type: String,
    /// Upstream provider (e.g., "watchcharts", "liv-ex", "charter_api")
    pub source_api: String,
    #[serde(default = "Utc::now")]
    pub ingestion_timestamp: DateTime<Utc>,
    /// Provider payload, kept verbatim
    pub raw_data: Value,
}

/// Why a listing could not become an observation
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("missing asset_type")]
    MissingAssetType,
    #[error("missing price")]
    MissingPrice,
    #[error("price is not numeric: {0}")]
    NonNumericPrice(String),
    #[error("price is not finite")]
    NonFinitePrice,
    #[error("price must be positive, got {0}")]
    NonPositivePrice(f64),
}

/// Extract `price` from a listing payload.
///
/// Accepts a JSON number or a string holding a plain decimal number.
/// Everything else is rejected rather than coerced.
pub fn extract_price(raw_data: &Value) -> Result<f64, ParseError> {
    let price = match raw_data.get("price") {
        None | Some(Value::Null) => return Err(ParseError::MissingPrice),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ParseError::NonNumericPrice(n.to_string()))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseError::NonNumericPrice(s.clone()))?,
        Some(other) => return Err(ParseError::NonNumericPrice(other.to_string())),
    };

    if !price.is_finite() {
        return Err(ParseError::NonFinitePrice);
    }
    if price <= 0.0 {
        return Err(ParseError::NonPositivePrice(price));
    }
    Ok(price)
}

impl RawListing {
    /// Create a listing stamped with the current time
    pub fn new(
        asset_type: impl Into<String>,
        source_api: impl Into<String>,
        raw_data: Value,
    ) -> Self {
        Self {
            asset_type: asset_type.into(),
            source_api: source_api.into(),
            ingestion_timestamp: Utc::now(),
            raw_data,
        }
    }

    /// Convert into a typed observation, failing closed on bad fields
    pub fn to_observation(&self) -> Result<PriceObservation, ParseError> {
        if self.asset_type.trim().is_empty() {
            return Err(ParseError::MissingAssetType);
        }
        Ok(PriceObservation {
            asset_type: self.asset_type.clone(),
            timestamp: self.ingestion_timestamp,
            price: extract_price(&self.raw_data)?,
        })
    }
}
