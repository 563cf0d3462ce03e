//! Domain types and the pure search logic shared by the server and CLI:
//! the natural-language query interpreter and the proximity filter.

pub mod app_config;
pub mod config;
pub mod keywords;
pub mod proximity;
pub mod query;
pub mod restaurants;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{load_keyword_tables, KeywordTables, SpecialityKeyword};
pub use proximity::{
    filter_nearby, great_circle_distance_m, Coord, NearbyRestaurant, DEFAULT_RADIUS_M,
    EARTH_RADIUS_M,
};
pub use query::{
    answer_from_snapshot, apply_filter, route, ChatbotAnswer, ParsedQuery, QueryInterpreter,
    RestaurantFilter, RoutePlan,
};
pub use restaurants::{
    Address, CoordinateValue, RestaurantStatus, RestaurantSummary, SpecialityRef,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid restaurant status: {0}")]
    InvalidStatus(String),

    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keywords file {path}: {source}")]
    KeywordsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keywords file: {0}")]
    KeywordsFileParse(#[from] serde_yaml::Error),

    #[error("keywords validation failed: {0}")]
    Validation(String),
}
