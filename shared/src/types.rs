//! Common types and presentation defaults used across the platform

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Image shown when a product or business has no uploaded image
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.svg";

/// Shown when a business has neither a city nor an address
pub const LOCATION_NOT_SPECIFIED: &str = "Location not specified";

/// Coerce a nullable numeric column into a plain number for display
pub fn coerce_price(price: Option<Decimal>) -> f64 {
    price.and_then(|p| p.to_f64()).unwrap_or(0.0)
}

/// Human readable location from optional city and address parts
pub fn display_location(city: Option<&str>, address: Option<&str>) -> String {
    let parts: Vec<&str> = [address, city]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        LOCATION_NOT_SPECIFIED.to_string()
    } else {
        parts.join(", ")
    }
}

/// Result-size limit for listing queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListLimit(u32);

impl ListLimit {
    pub const DEFAULT: u32 = 24;
    pub const MAX: u32 = 100;

    /// Clamp a requested limit into `1..=MAX`, falling back to the default
    pub fn new(requested: Option<u32>) -> Self {
        match requested {
            Some(0) | None => Self(Self::DEFAULT),
            Some(n) => Self(n.min(Self::MAX)),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

impl Default for ListLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}
