//! Restaurant write handlers: create, update, deactivate.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use restolover_core::{RestaurantStatus, RestaurantSummary};
use restolover_db::{NewRestaurant, RestaurantUpdate};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::super::{map_db_error, ApiError, ApiResponse, AppState};
use super::resolve_restaurant;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateRestaurantRequest {
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub address_id: Option<i64>,
    #[serde(default)]
    pub speciality_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub status: Option<String>,
    pub address_id: Option<i64>,
    pub speciality_ids: Option<Vec<i64>>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_name(req_id: &str, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > 200 {
        return Err(ApiError::validation(req_id, "name must be 1-200 characters"));
    }
    Ok(name.to_owned())
}

/// Ratings are stored as `NUMERIC(3,2)`.
fn validate_rating(req_id: &str, value: f64) -> Result<Decimal, ApiError> {
    if !(0.0..=5.0).contains(&value) {
        return Err(ApiError::validation(
            req_id,
            format!("rating must be between 0 and 5, got {value}"),
        ));
    }
    Decimal::try_from(value)
        .map(|d| d.round_dp(2))
        .map_err(|_| ApiError::validation(req_id, format!("rating {value} is not a number")))
}

fn validate_status(req_id: &str, value: &str) -> Result<RestaurantStatus, ApiError> {
    value.parse().map_err(|_| {
        ApiError::validation(
            req_id,
            format!("status must be 'active' or 'inactive', got '{value}'"),
        )
    })
}

fn validate_speciality_ids(req_id: &str, ids: &[i64]) -> Result<(), ApiError> {
    match ids.iter().find(|id| **id <= 0) {
        Some(id) => Err(ApiError::validation(
            req_id,
            format!("speciality id {id} is invalid"),
        )),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/restaurants: create an active restaurant.
pub(in crate::api) async fn create_restaurant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateRestaurantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RestaurantSummary>>), ApiError> {
    let rid = &req_id.0;

    let name = validate_name(rid, &body.name)?;
    let rating = body.rating.map(|r| validate_rating(rid, r)).transpose()?;
    validate_speciality_ids(rid, &body.speciality_ids)?;

    let new_restaurant = NewRestaurant {
        name,
        description: body.description,
        rating,
        address_id: body.address_id,
        speciality_ids: body.speciality_ids,
    };
    let row = restolover_db::create_restaurant(&state.pool, &new_restaurant)
        .await
        .map_err(|e| map_db_error(rid, &e, "restaurant"))?;

    let restaurant = restolover_db::get_restaurant(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(rid, &e, "restaurant"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(restaurant, req_id.0)),
    ))
}

/// PATCH /api/v1/restaurants/{id}: sparse update.
pub(in crate::api) async fn update_restaurant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRestaurantRequest>,
) -> Result<Json<ApiResponse<RestaurantSummary>>, ApiError> {
    let rid = &req_id.0;
    let existing = resolve_restaurant(&state.pool, &id, rid).await?;

    let update = RestaurantUpdate {
        name: body
            .name
            .as_deref()
            .map(|n| validate_name(rid, n))
            .transpose()?,
        description: body.description,
        rating: body.rating.map(|r| validate_rating(rid, r)).transpose()?,
        status: body
            .status
            .as_deref()
            .map(|s| validate_status(rid, s))
            .transpose()?,
        address_id: body.address_id,
        speciality_ids: body.speciality_ids,
    };
    if let Some(ids) = &update.speciality_ids {
        validate_speciality_ids(rid, ids)?;
    }
    if update.is_empty() {
        return Err(ApiError::validation(rid, "no fields to update"));
    }

    restolover_db::update_restaurant(&state.pool, existing.id, &update)
        .await
        .map_err(|e| map_db_error(rid, &e, &format!("restaurant {}", existing.id)))?;

    let restaurant = restolover_db::get_restaurant(&state.pool, existing.id)
        .await
        .map_err(|e| map_db_error(rid, &e, "restaurant"))?;

    Ok(Json(ApiResponse::new(restaurant, req_id.0)))
}

/// DELETE /api/v1/restaurants/{id}: soft delete.
pub(in crate::api) async fn deactivate_restaurant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let existing = resolve_restaurant(&state.pool, &id, rid).await?;

    restolover_db::deactivate_restaurant(&state.pool, existing.id)
        .await
        .map_err(|e| map_db_error(rid, &e, &format!("restaurant {}", existing.id)))?;

    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deactivated": true }),
        req_id.0,
    )))
}
