//! Address handlers, including geocoding against the address service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use restolover_core::{Address, Coord};
use restolover_db::{CityRow, NewAddress};
use restolover_geocoder::{Feature, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, map_geocoder_error, parse_id, ApiError, ApiResponse, AppState};

const MIN_GEOCODE_QUERY_CHARS: usize = 3;
const MAX_GEOCODE_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateAddressRequest {
    pub house_number: Option<String>,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub insee_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub only_delivery: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct FeatureAddressRequest {
    pub feature: Feature,
    #[serde(default)]
    pub only_delivery: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReverseQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CityItem {
    pub city: String,
    pub departement_code: String,
}

impl From<CityRow> for CityItem {
    fn from(row: CityRow) -> Self {
        Self {
            city: row.city,
            departement_code: row.departement_code,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn required_text(req_id: &str, field: &str, raw: &str) -> Result<String, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ApiError::validation(req_id, format!("{field} must not be empty")));
    }
    Ok(value.to_owned())
}

fn validate_postal_code(req_id: &str, raw: &str) -> Result<String, ApiError> {
    let code = raw.trim();
    if code.len() == 5 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code.to_owned())
    } else {
        Err(ApiError::validation(
            req_id,
            format!("postal_code must be 5 digits, got '{code}'"),
        ))
    }
}

/// Coordinates are optional but must come as a valid pair.
fn validate_coordinates(
    req_id: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Coord>, ApiError> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => Coord::checked(lat, lon)
            .map(Some)
            .map_err(|e| ApiError::validation(req_id, e.to_string())),
        _ => Err(ApiError::validation(
            req_id,
            "latitude and longitude must be given together",
        )),
    }
}

fn normalize_geocode_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_GEOCODE_LIMIT)
}

fn new_address_from_request(
    req_id: &str,
    body: CreateAddressRequest,
) -> Result<NewAddress, ApiError> {
    let coord = validate_coordinates(req_id, body.latitude, body.longitude)?;
    Ok(NewAddress {
        house_number: body
            .house_number
            .map(|h| h.trim().to_owned())
            .filter(|h| !h.is_empty()),
        street: required_text(req_id, "street", &body.street)?,
        postal_code: validate_postal_code(req_id, &body.postal_code)?,
        city: required_text(req_id, "city", &body.city)?,
        insee_code: body.insee_code,
        latitude: coord.map(|c| c.lat),
        longitude: coord.map(|c| c.lon),
        only_delivery: body.only_delivery,
    })
}

async fn store_address(
    state: &AppState,
    req_id: RequestId,
    address: NewAddress,
) -> Result<(StatusCode, Json<ApiResponse<Address>>), ApiError> {
    let row = restolover_db::create_address(&state.pool, &address)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e, "address"))?;
    tracing::info!(address_id = row.id, city = %row.city, "address created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(Address::from(row), req_id.0)),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/addresses/cities
pub(super) async fn list_cities(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CityItem>>>, ApiError> {
    let rows = restolover_db::list_cities(&state.pool)
        .await
        .map_err(|e| map_db_error(&req_id.0, &restolover_db::DbError::from(e), "cities"))?;

    let data = rows.into_iter().map(CityItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/addresses/{id}
pub(super) async fn get_address(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Address>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id, "address")?;
    let row = restolover_db::get_address(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid, &e, &format!("address {id}")))?;

    Ok(Json(ApiResponse::new(Address::from(row), req_id.0)))
}

/// POST /api/v1/addresses
pub(super) async fn create_address(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Address>>), ApiError> {
    let address = new_address_from_request(&req_id.0, body)?;
    store_address(&state, req_id, address).await
}

/// POST /api/v1/addresses/from-feature: store a feature picked from a
/// geocoding result.
pub(super) async fn create_address_from_feature(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<FeatureAddressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Address>>), ApiError> {
    let geocoded = body
        .feature
        .to_address()
        .map_err(|e| ApiError::validation(&req_id.0, e.to_string()))?;
    let address = NewAddress {
        house_number: geocoded.house_number,
        street: geocoded.street,
        postal_code: geocoded.postal_code,
        city: geocoded.city,
        insee_code: geocoded.insee_code,
        latitude: Some(geocoded.latitude),
        longitude: Some(geocoded.longitude),
        only_delivery: body.only_delivery,
    };
    store_address(&state, req_id, address).await
}

/// GET /api/v1/addresses/geocode?q=&limit=
pub(super) async fn geocode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<ApiResponse<Vec<Feature>>>, ApiError> {
    let rid = &req_id.0;
    let text = query.q.trim();
    if text.chars().count() < MIN_GEOCODE_QUERY_CHARS {
        return Err(ApiError::validation(
            rid,
            format!("q must be at least {MIN_GEOCODE_QUERY_CHARS} characters"),
        ));
    }

    let features = state
        .geocoder
        .search(text, normalize_geocode_limit(query.limit))
        .await
        .map_err(|e| map_geocoder_error(rid, &e))?;

    Ok(Json(ApiResponse::new(features, req_id.0)))
}

/// GET /api/v1/addresses/reverse?lat=&lon=&limit=
pub(super) async fn reverse_geocode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ApiResponse<Vec<Feature>>>, ApiError> {
    let rid = &req_id.0;
    let position = validate_coordinates(rid, query.lat, query.lon)?
        .ok_or_else(|| ApiError::validation(rid, "lat and lon are required"))?;

    let features = state
        .geocoder
        .reverse(position, normalize_geocode_limit(query.limit))
        .await
        .map_err(|e| map_geocoder_error(rid, &e))?;

    Ok(Json(ApiResponse::new(features, req_id.0)))
}
