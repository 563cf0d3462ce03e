//! Read operations for the `restaurants` table.

use std::collections::HashMap;

use restolover_core::{
    ChatbotAnswer, RestaurantFilter, RestaurantSummary, RoutePlan, SpecialityRef,
};
use sqlx::PgPool;

use super::types::{RestaurantListingRow, RestaurantSpecialityRow};
use crate::{contains_pattern, DbError};

const LISTING_SELECT: &str = "SELECT r.id, r.name, r.description, r.rating, r.status, \
        a.id AS address_id, a.house_number, a.street, a.postal_code, a.city, \
        a.insee_code, a.latitude, a.longitude, a.only_delivery \
     FROM restaurants r \
     LEFT JOIN addresses a ON a.id = r.address_id";

const SPECIALITY_MATCH: &str = "EXISTS (\
        SELECT 1 FROM restaurant_specialities rs \
        JOIN specialities s ON s.id = rs.speciality_id \
        WHERE rs.restaurant_id = r.id AND s.name ILIKE $1\
    )";

const BY_RATING: &str = "ORDER BY r.rating DESC NULLS LAST, r.id ASC";

fn filter_sql(filter: &RestaurantFilter) -> String {
    let predicate = match filter {
        RestaurantFilter::SpecialityAndCity { .. } => {
            format!("AND {SPECIALITY_MATCH} AND LOWER(a.city) = LOWER($2)")
        }
        RestaurantFilter::Speciality { .. } => format!("AND {SPECIALITY_MATCH}"),
        RestaurantFilter::City { .. } => "AND LOWER(a.city) = LOWER($1)".to_string(),
        RestaurantFilter::Text { .. } => {
            "AND (r.name ILIKE $1 OR r.description ILIKE $1)".to_string()
        }
        RestaurantFilter::All => String::new(),
    };
    format!("{LISTING_SELECT} WHERE r.status = 'active' {predicate} {BY_RATING}")
}

/// Active restaurants matching `filter`, best rated first (unrated last, then by id).
///
/// Speciality and text predicates are case-insensitive substring matches;
/// the city predicate is case-insensitive equality.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// stored status is not recognized.
pub async fn list_restaurants(
    pool: &PgPool,
    filter: &RestaurantFilter,
) -> Result<Vec<RestaurantSummary>, DbError> {
    let sql = filter_sql(filter);
    let query = sqlx::query_as::<_, RestaurantListingRow>(&sql);
    let query = match filter {
        RestaurantFilter::SpecialityAndCity { speciality, city } => {
            query.bind(contains_pattern(speciality)).bind(city.clone())
        }
        RestaurantFilter::Speciality { speciality } => query.bind(contains_pattern(speciality)),
        RestaurantFilter::City { city } => query.bind(city.clone()),
        RestaurantFilter::Text { text } => query.bind(contains_pattern(text)),
        RestaurantFilter::All => query,
    };

    let rows = query.fetch_all(pool).await?;
    attach_specialities(pool, rows).await
}

/// All active restaurants, newest first. Used as the candidate set for the
/// nearby search.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn list_active_restaurants(pool: &PgPool) -> Result<Vec<RestaurantSummary>, DbError> {
    let sql = format!(
        "{LISTING_SELECT} WHERE r.status = 'active' ORDER BY r.created_at DESC, r.id DESC"
    );
    let rows = sqlx::query_as::<_, RestaurantListingRow>(&sql)
        .fetch_all(pool)
        .await?;
    attach_specialities(pool, rows).await
}

/// Active restaurants linked to the speciality with `speciality_id`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn list_restaurants_by_speciality_id(
    pool: &PgPool,
    speciality_id: i64,
) -> Result<Vec<RestaurantSummary>, DbError> {
    let sql = format!(
        "{LISTING_SELECT} \
         WHERE r.status = 'active' \
           AND EXISTS (\
               SELECT 1 FROM restaurant_specialities rs \
               WHERE rs.restaurant_id = r.id AND rs.speciality_id = $1\
           ) \
         {BY_RATING}"
    );
    let rows = sqlx::query_as::<_, RestaurantListingRow>(&sql)
        .bind(speciality_id)
        .fetch_all(pool)
        .await?;
    attach_specialities(pool, rows).await
}

/// Free-text search over active restaurant names and descriptions.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn search_restaurants(
    pool: &PgPool,
    text: &str,
) -> Result<Vec<RestaurantSummary>, DbError> {
    list_restaurants(
        pool,
        &RestaurantFilter::Text {
            text: text.to_string(),
        },
    )
    .await
}

/// Fetch one restaurant by id, whatever its status.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id.
pub async fn get_restaurant(pool: &PgPool, id: i64) -> Result<RestaurantSummary, DbError> {
    let sql = format!("{LISTING_SELECT} WHERE r.id = $1");
    let row = sqlx::query_as::<_, RestaurantListingRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

    let mut summaries = attach_specialities(pool, vec![row]).await?;
    summaries.pop().ok_or(DbError::NotFound)
}

/// Runs a routed chatbot query. A free-text search that matches nothing is
/// retried as the full listing, with the listing's message.
///
/// # Errors
///
/// Returns [`DbError`] if either query fails.
pub async fn answer_query(pool: &PgPool, plan: &RoutePlan) -> Result<ChatbotAnswer, DbError> {
    let restaurants = list_restaurants(pool, &plan.filter).await?;
    if restaurants.is_empty() {
        if let Some(fallback) = plan.fallback() {
            tracing::debug!("free-text search empty, listing all restaurants");
            return Ok(ChatbotAnswer {
                restaurants: list_restaurants(pool, &fallback.filter).await?,
                message: fallback.message,
            });
        }
    }
    Ok(ChatbotAnswer {
        restaurants,
        message: plan.message.clone(),
    })
}

/// Loads every speciality of `rows` in one query and builds the summaries,
/// preserving row order.
async fn attach_specialities(
    pool: &PgPool,
    rows: Vec<RestaurantListingRow>,
) -> Result<Vec<RestaurantSummary>, DbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let links = sqlx::query_as::<_, RestaurantSpecialityRow>(
        "SELECT rs.restaurant_id, s.id, s.name \
         FROM restaurant_specialities rs \
         JOIN specialities s ON s.id = rs.speciality_id \
         WHERE rs.restaurant_id = ANY($1) \
         ORDER BY s.name ASC",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_restaurant: HashMap<i64, Vec<SpecialityRef>> = HashMap::new();
    for link in links {
        by_restaurant
            .entry(link.restaurant_id)
            .or_default()
            .push(SpecialityRef {
                id: link.id,
                name: link.name,
            });
    }

    rows.into_iter()
        .map(|row| {
            let specialities = by_restaurant.remove(&row.id).unwrap_or_default();
            row.into_summary(specialities).map_err(DbError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_filter_is_restricted_to_active_and_ordered_by_rating() {
        let filters = [
            RestaurantFilter::SpecialityAndCity {
                speciality: "Japonais".to_string(),
                city: "Lyon".to_string(),
            },
            RestaurantFilter::Speciality {
                speciality: "Japonais".to_string(),
            },
            RestaurantFilter::City {
                city: "Lyon".to_string(),
            },
            RestaurantFilter::Text {
                text: "sushi".to_string(),
            },
            RestaurantFilter::All,
        ];
        for filter in &filters {
            let sql = filter_sql(filter);
            assert!(sql.contains("r.status = 'active'"), "{sql}");
            assert!(sql.ends_with(BY_RATING), "{sql}");
        }
    }

    #[test]
    fn speciality_and_city_binds_two_parameters() {
        let sql = filter_sql(&RestaurantFilter::SpecialityAndCity {
            speciality: "Italien".to_string(),
            city: "Paris".to_string(),
        });
        assert!(sql.contains("s.name ILIKE $1"));
        assert!(sql.contains("LOWER(a.city) = LOWER($2)"));
    }

    #[test]
    fn text_filter_keeps_status_check_outside_the_or() {
        let sql = filter_sql(&RestaurantFilter::Text {
            text: "x".to_string(),
        });
        assert!(sql.contains("AND (r.name ILIKE $1 OR r.description ILIKE $1)"));
    }

    #[test]
    fn all_filter_has_no_parameters() {
        let sql = filter_sql(&RestaurantFilter::All);
        assert!(!sql.contains('$'));
    }
}
