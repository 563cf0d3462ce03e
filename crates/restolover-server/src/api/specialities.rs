//! Speciality CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use restolover_db::SpecialityRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, parse_id, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SpecialityRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SpecialityItem {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SpecialityRow> for SpecialityItem {
    fn from(row: SpecialityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn validate_name(req_id: &str, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > 100 {
        return Err(ApiError::validation(req_id, "name must be 1-100 characters"));
    }
    Ok(name.to_owned())
}

pub(super) async fn list_specialities(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<SpecialityItem>>>, ApiError> {
    let rows = restolover_db::list_specialities(&state.pool)
        .await
        .map_err(|e| map_db_error(&req_id.0, &restolover_db::DbError::from(e), "specialities"))?;

    let data = rows.into_iter().map(SpecialityItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_speciality(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SpecialityItem>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id, "speciality")?;
    let row = restolover_db::get_speciality(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid, &e, &format!("speciality {id}")))?;

    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

pub(super) async fn create_speciality(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SpecialityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SpecialityItem>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, &body.name)?;
    let row = restolover_db::create_speciality(&state.pool, &name)
        .await
        .map_err(|e| map_db_error(rid, &e, "speciality"))?;
    tracing::info!(speciality_id = row.id, name = %row.name, "speciality created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(row.into(), req_id.0)),
    ))
}

pub(super) async fn rename_speciality(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<SpecialityRequest>,
) -> Result<Json<ApiResponse<SpecialityItem>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id, "speciality")?;
    let name = validate_name(rid, &body.name)?;
    let row = restolover_db::rename_speciality(&state.pool, id, &name)
        .await
        .map_err(|e| map_db_error(rid, &e, &format!("speciality {id}")))?;

    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

pub(super) async fn delete_speciality(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id, "speciality")?;
    restolover_db::delete_speciality(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid, &e, &format!("speciality {id}")))?;
    tracing::info!(speciality_id = id, "speciality deleted");

    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}
