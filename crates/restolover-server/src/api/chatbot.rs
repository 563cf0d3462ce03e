//! Free-text restaurant search: `GET /api/v1/restaurants/chatbot?q=`.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use restolover_core::{ParsedQuery, QueryInterpreter, RestaurantSummary};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ChatbotQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatbotResponse {
    pub restaurants: Vec<RestaurantSummary>,
    pub message: String,
    pub parsed: ParsedQuery,
}

pub(super) async fn chatbot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ChatbotQuery>,
) -> Result<Json<ApiResponse<ChatbotResponse>>, ApiError> {
    let rid = &req_id.0;
    let (parsed, plan) = QueryInterpreter::new(&state.keywords).interpret(&query.q);
    tracing::info!(
        speciality = parsed.speciality.as_deref(),
        city = parsed.city.as_deref(),
        residual = parsed.residual_text.as_deref(),
        "chatbot query interpreted"
    );

    let answer = restolover_db::answer_query(&state.pool, &plan)
        .await
        .map_err(|e| map_db_error(rid, &e, "restaurants"))?;

    Ok(Json(ApiResponse::new(
        ChatbotResponse {
            restaurants: answer.restaurants,
            message: answer.message,
            parsed,
        },
        req_id.0,
    )))
}
