mod addresses;
mod chatbot;
mod nearby;
mod restaurants;
mod specialities;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use restolover_core::{AppConfig, KeywordTables, DEFAULT_RADIUS_M};
use restolover_db::DbError;
use restolover_geocoder::{GeocoderClient, GeocoderError};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

const DEFAULT_MAX_RADIUS_M: f64 = 50_000.0;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub keywords: Arc<KeywordTables>,
    pub geocoder: GeocoderClient,
    pub nearby: NearbySettings,
}

/// Radius bounds applied by the nearby search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbySettings {
    pub default_radius_m: f64,
    pub max_radius_m: f64,
}

impl Default for NearbySettings {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_RADIUS_M,
            max_radius_m: DEFAULT_MAX_RADIUS_M,
        }
    }
}

impl NearbySettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            default_radius_m: config.nearby_default_radius_m,
            max_radius_m: config.nearby_max_radius_m,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn validation(request_id: &str, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "location_required" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps a database error onto the API error codes. `what` names the missing
/// record in `not_found` messages.
pub(super) fn map_db_error(request_id: &str, error: &DbError, what: &str) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", format!("{what} not found")),
        DbError::Conflict(message) => ApiError::new(request_id, "conflict", message.clone()),
        DbError::InvalidReference(message) => ApiError::validation(request_id, message.clone()),
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_geocoder_error(request_id: &str, error: &GeocoderError) -> ApiError {
    tracing::warn!(error = %error, "geocoding request failed");
    ApiError::new(request_id, "upstream_error", "geocoding service unavailable")
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn public_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/restaurants", get(restaurants::list_restaurants))
        .route(
            "/api/v1/restaurants/search",
            get(restaurants::search_restaurants),
        )
        .route("/api/v1/restaurants/chatbot", get(chatbot::chatbot))
        .route("/api/v1/restaurants/nearby", get(nearby::list_nearby))
        .route(
            "/api/v1/restaurants/by-city/{city}",
            get(restaurants::list_restaurants_by_city),
        )
        .route("/api/v1/restaurants/{id}", get(restaurants::get_restaurant))
        .route(
            "/api/v1/specialities",
            get(specialities::list_specialities),
        )
        .route(
            "/api/v1/specialities/{id}",
            get(specialities::get_speciality),
        )
        .route("/api/v1/addresses/cities", get(addresses::list_cities))
        .route("/api/v1/addresses/geocode", get(addresses::geocode))
        .route("/api/v1/addresses/reverse", get(addresses::reverse_geocode))
        .route("/api/v1/addresses/{id}", get(addresses::get_address))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/restaurants", post(restaurants::create_restaurant))
        .route(
            "/api/v1/restaurants/{id}",
            patch(restaurants::update_restaurant).delete(restaurants::deactivate_restaurant),
        )
        .route(
            "/api/v1/specialities",
            post(specialities::create_speciality),
        )
        .route(
            "/api/v1/specialities/{id}",
            patch(specialities::rename_speciality).delete(specialities::delete_speciality),
        )
        .route("/api/v1/addresses", post(addresses::create_address))
        .route(
            "/api/v1/addresses/from-feature",
            post(addresses::create_address_from_feature),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(
    state: AppState,
    auth: AuthState,
    rate_limit: RateLimitState,
    cors_origins: &[String],
) -> Router {
    let health_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(health_routes)
        .merge(public_router(rate_limit.clone()))
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(cors_origins))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match restolover_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

/// Parses an id path segment, reporting non-numeric ids as `not_found`.
pub(super) fn parse_id(request_id: &str, raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::new(request_id, "not_found", format!("{what} not found")))
}

#[cfg(test)]
mod tests;
