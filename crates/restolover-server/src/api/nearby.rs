//! `GET /api/v1/restaurants/nearby?lat=&lon=&radius_m=`

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use restolover_core::{filter_nearby, Coord, NearbyRestaurant};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, NearbySettings};

#[derive(Debug, Deserialize)]
pub(super) struct NearbyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_m: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct NearbyResponse {
    pub reference: Coord,
    pub radius_m: f64,
    pub restaurants: Vec<NearbyRestaurant>,
}

fn resolve_reference(req_id: &str, query: &NearbyQuery) -> Result<Coord, ApiError> {
    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(ApiError::new(
            req_id,
            "location_required",
            "your position is required: allow location access and retry",
        ));
    };
    Coord::checked(lat, lon).map_err(|e| ApiError::validation(req_id, e.to_string()))
}

fn resolve_radius(
    req_id: &str,
    requested: Option<f64>,
    settings: NearbySettings,
) -> Result<f64, ApiError> {
    let Some(radius) = requested else {
        return Ok(settings.default_radius_m);
    };
    if !radius.is_finite() || radius <= 0.0 || radius > settings.max_radius_m {
        return Err(ApiError::validation(
            req_id,
            format!(
                "radius_m must be greater than 0 and at most {}",
                settings.max_radius_m
            ),
        ));
    }
    Ok(radius)
}

pub(super) async fn list_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<NearbyResponse>>, ApiError> {
    let rid = &req_id.0;
    let reference = resolve_reference(rid, &query)?;
    let radius_m = resolve_radius(rid, query.radius_m, state.nearby)?;

    let candidates = restolover_db::list_active_restaurants(&state.pool)
        .await
        .map_err(|e| map_db_error(rid, &e, "restaurants"))?;
    let restaurants = filter_nearby(reference, &candidates, radius_m);
    tracing::debug!(
        candidates = candidates.len(),
        matches = restaurants.len(),
        radius_m,
        "nearby search"
    );

    Ok(Json(ApiResponse::new(
        NearbyResponse {
            reference,
            radius_m,
            restaurants,
        },
        req_id.0,
    )))
}
