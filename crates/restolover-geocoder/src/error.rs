use thiserror::Error;

/// Errors returned by the geocoding client.
#[derive(Debug, Error)]
pub enum GeocoderError {
    /// Network or TLS failure, or a non-2xx status from the service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid geocoder base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A feature lacks a field required to build an address.
    #[error("incomplete address feature: missing {0}")]
    IncompleteFeature(&'static str),
}
