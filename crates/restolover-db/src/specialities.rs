//! Database operations for the `specialities` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpecialityRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// All specialities ordered by name.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_specialities(pool: &PgPool) -> Result<Vec<SpecialityRow>, sqlx::Error> {
    sqlx::query_as::<_, SpecialityRow>(
        "SELECT id, name, created_at, updated_at FROM specialities ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no speciality has this id.
pub async fn get_speciality(pool: &PgPool, id: i64) -> Result<SpecialityRow, DbError> {
    sqlx::query_as::<_, SpecialityRow>(
        "SELECT id, name, created_at, updated_at FROM specialities WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Insert a speciality.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the name is already taken.
pub async fn create_speciality(pool: &PgPool, name: &str) -> Result<SpecialityRow, DbError> {
    sqlx::query_as::<_, SpecialityRow>(
        "INSERT INTO specialities (name) VALUES ($1) \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| DbError::from_write(e, "speciality"))
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no speciality has this id, or
/// [`DbError::Conflict`] if the new name is already taken.
pub async fn rename_speciality(
    pool: &PgPool,
    id: i64,
    name: &str,
) -> Result<SpecialityRow, DbError> {
    sqlx::query_as::<_, SpecialityRow>(
        "UPDATE specialities SET name = $2, updated_at = NOW() WHERE id = $1 \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| DbError::from_write(e, "speciality"))?
    .ok_or(DbError::NotFound)
}

/// Delete a speciality; its restaurant links go with it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no speciality has this id.
pub async fn delete_speciality(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM specialities WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
