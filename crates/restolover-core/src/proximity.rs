//! Great-circle distance and radius filtering around a reference position.

use serde::{Deserialize, Serialize};

use crate::restaurants::RestaurantSummary;
use crate::CoreError;

/// Mean earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Radius used by the nearby search when the caller does not supply one.
pub const DEFAULT_RADIUS_M: f64 = 2_000.0;

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Builds a coordinate after checking it is finite and within
    /// `-90..=90` latitude and `-180..=180` longitude.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when either bound is violated.
    pub fn checked(lat: f64, lon: f64) -> Result<Self, CoreError> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(CoreError::InvalidCoordinate { lat, lon })
        }
    }
}

/// A restaurant inside the search radius, with its normalized position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyRestaurant {
    pub restaurant: RestaurantSummary,
    pub coordinate: Coord,
    pub distance_m: f64,
}

/// Haversine distance between two positions on a spherical earth, in meters.
///
/// Inputs are not validated.
#[must_use]
pub fn great_circle_distance_m(a: Coord, b: Coord) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let sin_d_lat = (d_lat / 2.0).sin();
    let sin_d_lon = (d_lon / 2.0).sin();
    let h = sin_d_lat * sin_d_lat + lat1.cos() * lat2.cos() * sin_d_lon * sin_d_lon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Restaurants within `radius_m` of `reference`, nearest first.
///
/// Candidates without a usable coordinate are skipped. Equal distances keep
/// their input order. The reference itself must already be validated, see
/// [`Coord::checked`].
#[must_use]
pub fn filter_nearby(
    reference: Coord,
    candidates: &[RestaurantSummary],
    radius_m: f64,
) -> Vec<NearbyRestaurant> {
    let mut nearby: Vec<NearbyRestaurant> = candidates
        .iter()
        .filter_map(|restaurant| {
            let coordinate = restaurant.coord()?;
            let distance_m = great_circle_distance_m(reference, coordinate);
            (distance_m <= radius_m).then(|| NearbyRestaurant {
                restaurant: restaurant.clone(),
                coordinate,
                distance_m,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    nearby
}

#[cfg(test)]
#[path = "proximity_test.rs"]
mod tests;
