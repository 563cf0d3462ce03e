//! GeoJSON response types returned by the geocoding service.

use restolover_core::Coord;
use serde::{Deserialize, Serialize};

use crate::error::GeocoderError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

/// A GeoJSON point; `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub score: Option<f64>,
    /// BAN identifier of the address.
    #[serde(default)]
    pub id: Option<String>,
    /// Result granularity: `housenumber`, `street`, `locality` or `municipality`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub housenumber: Option<String>,
    /// Alternate spelling found in features echoed back by clients.
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    /// INSEE code of the municipality.
    #[serde(default)]
    pub citycode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Address fields extracted from a feature, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedAddress {
    pub house_number: Option<String>,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub insee_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Feature {
    /// The feature position with latitude and longitude swapped back from GeoJSON order.
    #[must_use]
    pub fn coord(&self) -> Coord {
        let [lon, lat] = self.geometry.coordinates;
        Coord { lat, lon }
    }

    /// Converts the feature into storable address fields.
    ///
    /// The street falls back to `name` for street-level results.
    ///
    /// # Errors
    ///
    /// Returns [`GeocoderError::IncompleteFeature`] when the street, postcode
    /// or city is missing.
    pub fn to_address(&self) -> Result<GeocodedAddress, GeocoderError> {
        let props = &self.properties;
        let street = props
            .street
            .clone()
            .or_else(|| props.name.clone())
            .ok_or(GeocoderError::IncompleteFeature("street"))?;
        let postal_code = props
            .postcode
            .clone()
            .ok_or(GeocoderError::IncompleteFeature("postcode"))?;
        let city = props
            .city
            .clone()
            .ok_or(GeocoderError::IncompleteFeature("city"))?;
        let coord = self.coord();

        Ok(GeocodedAddress {
            house_number: props
                .house_number
                .clone()
                .or_else(|| props.housenumber.clone()),
            street,
            postal_code,
            city,
            insee_code: props.citycode.clone(),
            latitude: coord.lat,
            longitude: coord.lon,
        })
    }
}
