use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use restolover_core::{RestaurantFilter, RestaurantSummary};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::super::{map_db_error, ApiError, ApiResponse, AppState};
use super::resolve_restaurant;

#[derive(Debug, Deserialize)]
pub(in crate::api) struct RestaurantListQuery {
    pub speciality_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/v1/restaurants: every active restaurant, or those linked to
/// `speciality_id` when given.
pub(in crate::api) async fn list_restaurants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RestaurantListQuery>,
) -> Result<Json<ApiResponse<Vec<RestaurantSummary>>>, ApiError> {
    let rid = &req_id.0;
    let restaurants = match query.speciality_id {
        Some(speciality_id) => {
            restolover_db::list_restaurants_by_speciality_id(&state.pool, speciality_id).await
        }
        None => restolover_db::list_active_restaurants(&state.pool).await,
    }
    .map_err(|e| map_db_error(rid, &e, "restaurants"))?;

    Ok(Json(ApiResponse::new(restaurants, req_id.0)))
}

/// GET /api/v1/restaurants/search?q=
pub(in crate::api) async fn search_restaurants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<RestaurantSummary>>>, ApiError> {
    let rid = &req_id.0;
    let text = query.q.trim();
    if text.is_empty() {
        return Err(ApiError::validation(rid, "q must not be empty"));
    }

    let restaurants = restolover_db::search_restaurants(&state.pool, text)
        .await
        .map_err(|e| map_db_error(rid, &e, "restaurants"))?;

    Ok(Json(ApiResponse::new(restaurants, req_id.0)))
}

/// GET /api/v1/restaurants/by-city/{city}
pub(in crate::api) async fn list_restaurants_by_city(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(city): Path<String>,
) -> Result<Json<ApiResponse<Vec<RestaurantSummary>>>, ApiError> {
    let rid = &req_id.0;
    let filter = RestaurantFilter::City {
        city: city.trim().to_owned(),
    };

    let restaurants = restolover_db::list_restaurants(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(rid, &e, "restaurants"))?;

    Ok(Json(ApiResponse::new(restaurants, req_id.0)))
}

/// GET /api/v1/restaurants/{id}
pub(in crate::api) async fn get_restaurant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RestaurantSummary>>, ApiError> {
    let restaurant = resolve_restaurant(&state.pool, &id, &req_id.0).await?;
    Ok(Json(ApiResponse::new(restaurant, req_id.0)))
}
