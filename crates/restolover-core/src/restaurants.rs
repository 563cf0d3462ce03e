use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::proximity::Coord;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestaurantStatus {
    #[default]
    Active,
    Inactive,
}

impl RestaurantStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RestaurantStatus::Active => "active",
            RestaurantStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for RestaurantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestaurantStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RestaurantStatus::Active),
            "inactive" => Ok(RestaurantStatus::Inactive),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// A latitude or longitude as it arrives from JSON or the database layer.
///
/// Decimal columns are commonly serialized as strings, so both shapes are
/// accepted here and normalized by [`CoordinateValue::to_f64`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    /// Returns the finite floating-point value, or `None` when the value is
    /// unparsable, `NaN` or infinite.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            CoordinateValue::Number(n) => *n,
            CoordinateValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        CoordinateValue::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialityRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    #[serde(default)]
    pub house_number: Option<String>,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    #[serde(default)]
    pub insee_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<CoordinateValue>,
    #[serde(default)]
    pub longitude: Option<CoordinateValue>,
    #[serde(default)]
    pub only_delivery: bool,
}

impl Address {
    /// Normalizes the raw latitude/longitude into a [`Coord`].
    ///
    /// Returns `None` if either component is missing, not a finite number,
    /// or outside the latitude/longitude ranges accepted by [`Coord::checked`].
    #[must_use]
    pub fn coord(&self) -> Option<Coord> {
        let lat = self.latitude.as_ref()?.to_f64()?;
        let lon = self.longitude.as_ref()?.to_f64()?;
        Coord::checked(lat, lon).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub status: RestaurantStatus,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub specialities: Vec<SpecialityRef>,
}

impl RestaurantSummary {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == RestaurantStatus::Active
    }

    /// The restaurant's normalized coordinate, if its address carries one.
    #[must_use]
    pub fn coord(&self) -> Option<Coord> {
        self.address.as_ref().and_then(Address::coord)
    }
}
