//! Database operations for the `addresses` table.

use chrono::{DateTime, Utc};
use restolover_core::{Address, CoordinateValue};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sqlx::PgPool;

use crate::DbError;

/// Input record for inserting an address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAddress {
    pub house_number: Option<String>,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub insee_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub only_delivery: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AddressRow {
    pub id: i64,
    pub house_number: Option<String>,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub insee_code: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub only_delivery: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            house_number: row.house_number,
            street: row.street,
            postal_code: row.postal_code,
            city: row.city,
            insee_code: row.insee_code,
            latitude: row
                .latitude
                .and_then(|d| d.to_f64())
                .map(CoordinateValue::Number),
            longitude: row
                .longitude
                .and_then(|d| d.to_f64())
                .map(CoordinateValue::Number),
            only_delivery: row.only_delivery,
        }
    }
}

const ADDRESS_COLUMNS: &str = "id, house_number, street, postal_code, city, insee_code, \
     latitude, longitude, only_delivery, created_at, updated_at";

/// Insert an address. Coordinates are bound as `float8` and rounded by the
/// `NUMERIC` columns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including out-of-range
/// coordinates rejected by the table constraints.
pub async fn create_address(pool: &PgPool, address: &NewAddress) -> Result<AddressRow, DbError> {
    let sql = format!(
        "INSERT INTO addresses \
             (house_number, street, postal_code, city, insee_code, latitude, longitude, only_delivery) \
         VALUES ($1, $2, $3, $4, $5, $6::float8, $7::float8, $8) \
         RETURNING {ADDRESS_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AddressRow>(&sql)
        .bind(&address.house_number)
        .bind(&address.street)
        .bind(&address.postal_code)
        .bind(&address.city)
        .bind(&address.insee_code)
        .bind(address.latitude)
        .bind(address.longitude)
        .bind(address.only_delivery)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no address has this id.
pub async fn get_address(pool: &PgPool, id: i64) -> Result<AddressRow, DbError> {
    let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1");
    sqlx::query_as::<_, AddressRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// One distinct city with the department code taken from its lowest postal code.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CityRow {
    pub city: String,
    pub departement_code: String,
}

/// Distinct cities across all stored addresses, ordered by lowest postal code
/// then name.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_cities(pool: &PgPool) -> Result<Vec<CityRow>, sqlx::Error> {
    sqlx::query_as::<_, CityRow>(
        "SELECT city, LEFT(MIN(postal_code), 2) AS departement_code \
         FROM addresses \
         GROUP BY city \
         ORDER BY MIN(postal_code) ASC, city ASC",
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_row_converts_into_core_address() {
        let row = AddressRow {
            id: 4,
            house_number: None,
            street: "Place Bellecour".to_string(),
            postal_code: "69002".to_string(),
            city: "Lyon".to_string(),
            insee_code: Some("69382".to_string()),
            latitude: Some(Decimal::new(4_575_780_000, 8)),
            longitude: None,
            only_delivery: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let address = Address::from(row);
        assert_eq!(address.city, "Lyon");
        assert!(address.only_delivery);
        let lat = address
            .latitude
            .as_ref()
            .and_then(CoordinateValue::to_f64)
            .expect("latitude");
        assert!((lat - 45.7578).abs() < 1e-9);
        assert!(address.coord().is_none());
    }
}
