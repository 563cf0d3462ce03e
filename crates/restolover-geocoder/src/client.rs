//! HTTP client for the address search and reverse geocoding endpoints.

use std::time::Duration;

use reqwest::{Client, Url};
use restolover_core::Coord;

use crate::error::GeocoderError;
use crate::types::{Feature, FeatureCollection};

const DEFAULT_BASE_URL: &str = "https://api-adresse.data.gouv.fr/";

/// Result count used when the caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Client for the geocoding service.
///
/// Use [`GeocoderClient::new`] for production or
/// [`GeocoderClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct GeocoderClient {
    client: Client,
    base_url: Url,
}

impl GeocoderClient {
    /// Creates a client pointed at the public service.
    ///
    /// # Errors
    ///
    /// Returns [`GeocoderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, GeocoderError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeocoderError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`GeocoderError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, GeocoderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("restolover/0.1 (address-geocoding)")
            .build()?;

        // Exactly one trailing slash, so relative joins append to the path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeocoderError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Forward geocoding: addresses matching free text such as `"75001 Paris"`.
    ///
    /// # Errors
    ///
    /// - [`GeocoderError::Http`] on network failure or non-2xx HTTP status.
    /// - [`GeocoderError::Deserialize`] if the body is not a feature collection.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Feature>, GeocoderError> {
        let url = self.build_url("search/", &[("q", query), ("limit", &limit.to_string())])?;
        let features = self.fetch_features(url, &format!("search(q={query})")).await?;
        tracing::debug!(query, results = features.len(), "geocoder search");
        Ok(features)
    }

    /// Reverse geocoding: addresses closest to `position`.
    ///
    /// # Errors
    ///
    /// - [`GeocoderError::Http`] on network failure or non-2xx HTTP status.
    /// - [`GeocoderError::Deserialize`] if the body is not a feature collection.
    pub async fn reverse(
        &self,
        position: Coord,
        limit: u32,
    ) -> Result<Vec<Feature>, GeocoderError> {
        let url = self.build_url(
            "reverse/",
            &[
                ("lat", &position.lat.to_string()),
                ("lon", &position.lon.to_string()),
                ("limit", &limit.to_string()),
            ],
        )?;
        let context = format!("reverse(lat={}, lon={})", position.lat, position.lon);
        self.fetch_features(url, &context).await
    }

    /// Joins `path` onto the base URL and appends percent-encoded query pairs.
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, GeocoderError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| GeocoderError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn fetch_features(&self, url: Url, context: &str) -> Result<Vec<Feature>, GeocoderError> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        let collection: FeatureCollection =
            serde_json::from_str(&body).map_err(|e| GeocoderError::Deserialize {
                context: context.to_string(),
                source: e,
            })?;
        Ok(collection.features)
    }
}
