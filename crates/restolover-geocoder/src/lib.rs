//! Client for the Base Adresse Nationale geocoding API
//! (`api-adresse.data.gouv.fr`), used to turn free-form French addresses into
//! coordinates and back.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GeocoderClient, DEFAULT_LIMIT};
pub use error::GeocoderError;
pub use types::{Feature, FeatureCollection, FeatureProperties, GeocodedAddress, Geometry};
