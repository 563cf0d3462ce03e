//! Write operations for the `restaurants` table.

use restolover_core::RestaurantStatus;
use sqlx::{PgPool, Postgres, Transaction};

use super::types::{NewRestaurant, RestaurantRow, RestaurantUpdate};
use crate::DbError;

const RESTAURANT_COLUMNS: &str =
    "id, name, description, rating, status, address_id, created_at, updated_at";

/// Insert a restaurant and its speciality links in one transaction.
///
/// New restaurants are always `active`.
///
/// # Errors
///
/// Returns [`DbError::InvalidReference`] if the address or a speciality does
/// not exist, or [`DbError::Sqlx`] for any other database failure.
pub async fn create_restaurant(
    pool: &PgPool,
    restaurant: &NewRestaurant,
) -> Result<RestaurantRow, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO restaurants (name, description, rating, address_id, status) \
         VALUES ($1, $2, $3, $4, 'active') \
         RETURNING {RESTAURANT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, RestaurantRow>(&sql)
        .bind(&restaurant.name)
        .bind(&restaurant.description)
        .bind(restaurant.rating)
        .bind(restaurant.address_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from_write(e, "restaurant"))?;

    link_specialities(&mut tx, row.id, &restaurant.speciality_ids).await?;
    tx.commit().await?;

    tracing::info!(restaurant_id = row.id, name = %row.name, "restaurant created");
    Ok(row)
}

/// Apply a sparse update. When `speciality_ids` is set, the links are
/// replaced wholesale.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no restaurant has this id, or
/// [`DbError::InvalidReference`] if a referenced row does not exist.
pub async fn update_restaurant(
    pool: &PgPool,
    id: i64,
    update: &RestaurantUpdate,
) -> Result<RestaurantRow, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "UPDATE restaurants SET \
             name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             rating = COALESCE($4, rating), \
             status = COALESCE($5, status), \
             address_id = COALESCE($6, address_id), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {RESTAURANT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, RestaurantRow>(&sql)
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.rating)
        .bind(update.status.map(RestaurantStatus::as_str))
        .bind(update.address_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DbError::from_write(e, "restaurant"))?
        .ok_or(DbError::NotFound)?;

    if let Some(speciality_ids) = &update.speciality_ids {
        sqlx::query("DELETE FROM restaurant_specialities WHERE restaurant_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_specialities(&mut tx, id, speciality_ids).await?;
    }

    tx.commit().await?;
    Ok(row)
}

/// Soft delete: flips the status to `inactive` so the restaurant drops out of
/// every listing while its row and links are kept.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no restaurant has this id.
pub async fn deactivate_restaurant(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE restaurants SET status = 'inactive', updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    tracing::info!(restaurant_id = id, "restaurant deactivated");
    Ok(())
}

async fn link_specialities(
    tx: &mut Transaction<'_, Postgres>,
    restaurant_id: i64,
    speciality_ids: &[i64],
) -> Result<(), DbError> {
    if speciality_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO restaurant_specialities (restaurant_id, speciality_id) \
         SELECT $1, * FROM UNNEST($2::bigint[]) \
         ON CONFLICT DO NOTHING",
    )
    .bind(restaurant_id)
    .bind(speciality_ids)
    .execute(&mut **tx)
    .await
    .map_err(|e| DbError::from_write(e, "restaurant speciality"))?;
    Ok(())
}
