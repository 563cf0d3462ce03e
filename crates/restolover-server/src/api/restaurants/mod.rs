//! Restaurant API handlers.
//!
//! - `GET /api/v1/restaurants`                 active restaurants, newest first
//! - `GET /api/v1/restaurants?speciality_id=`  by speciality, best rated first
//! - `GET /api/v1/restaurants/search?q=`       name/description search
//! - `GET /api/v1/restaurants/by-city/{city}`  active restaurants in one city
//! - `GET /api/v1/restaurants/{id}`            one restaurant, any status
//! - `POST|PATCH|DELETE` write routes (bearer auth)

mod read;
mod write;

pub(super) use read::{
    get_restaurant, list_restaurants, list_restaurants_by_city, search_restaurants,
};
pub(super) use write::{create_restaurant, deactivate_restaurant, update_restaurant};

use restolover_core::RestaurantSummary;

use super::{map_db_error, parse_id, ApiError};

/// Resolve a restaurant id path segment, returning 404 if it does not exist.
async fn resolve_restaurant(
    pool: &sqlx::PgPool,
    raw_id: &str,
    request_id: &str,
) -> Result<RestaurantSummary, ApiError> {
    let id = parse_id(request_id, raw_id, "restaurant")?;
    restolover_db::get_restaurant(pool, id)
        .await
        .map_err(|e| map_db_error(request_id, &e, &format!("restaurant {id}")))
}
