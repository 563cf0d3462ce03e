//! Row and input types for the `restaurants` table.

use chrono::{DateTime, Utc};
use restolover_core::{
    Address, CoordinateValue, CoreError, RestaurantStatus, RestaurantSummary, SpecialityRef,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};

/// A row from the `restaurants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RestaurantRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<Decimal>,
    pub status: String,
    pub address_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input record for inserting a restaurant.
#[derive(Debug, Clone, Default)]
pub struct NewRestaurant {
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<Decimal>,
    pub address_id: Option<i64>,
    pub speciality_ids: Vec<i64>,
}

/// Sparse update; `None` fields keep their stored value.
///
/// `speciality_ids: Some(vec![])` clears every speciality link.
#[derive(Debug, Clone, Default)]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rating: Option<Decimal>,
    pub status: Option<RestaurantStatus>,
    pub address_id: Option<i64>,
    pub speciality_ids: Option<Vec<i64>>,
}

impl RestaurantUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.rating.is_none()
            && self.status.is_none()
            && self.address_id.is_none()
            && self.speciality_ids.is_none()
    }
}

/// A restaurant joined with its (optional) address.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RestaurantListingRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<Decimal>,
    pub status: String,
    pub address_id: Option<i64>,
    pub house_number: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub insee_code: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub only_delivery: Option<bool>,
}

/// One speciality link, keyed by restaurant.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RestaurantSpecialityRow {
    pub restaurant_id: i64,
    pub id: i64,
    pub name: String,
}

impl RestaurantListingRow {
    pub(crate) fn into_summary(
        self,
        specialities: Vec<SpecialityRef>,
    ) -> Result<RestaurantSummary, CoreError> {
        let status = self.status.parse::<RestaurantStatus>()?;
        let address = match (self.address_id, self.street, self.postal_code, self.city) {
            (Some(id), Some(street), Some(postal_code), Some(city)) => Some(Address {
                id,
                house_number: self.house_number,
                street,
                postal_code,
                city,
                insee_code: self.insee_code,
                latitude: self.latitude.as_ref().and_then(decimal_coordinate),
                longitude: self.longitude.as_ref().and_then(decimal_coordinate),
                only_delivery: self.only_delivery.unwrap_or(false),
            }),
            _ => None,
        };

        Ok(RestaurantSummary {
            id: self.id,
            name: self.name,
            description: self.description,
            rating: self.rating.as_ref().and_then(ToPrimitive::to_f64),
            status,
            address,
            specialities,
        })
    }
}

fn decimal_coordinate(value: &Decimal) -> Option<CoordinateValue> {
    value.to_f64().map(CoordinateValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_row() -> RestaurantListingRow {
        RestaurantListingRow {
            id: 1,
            name: "Chez Paul".to_string(),
            description: Some("Bistrot".to_string()),
            rating: Some(Decimal::new(450, 2)),
            status: "active".to_string(),
            address_id: Some(9),
            house_number: Some("13".to_string()),
            street: Some("Rue de Charonne".to_string()),
            postal_code: Some("75011".to_string()),
            city: Some("Paris".to_string()),
            insee_code: None,
            latitude: Some(Decimal::new(4_885_340_000, 8)),
            longitude: Some(Decimal::new(237_950_000, 8)),
            only_delivery: Some(false),
        }
    }

    #[test]
    fn listing_row_converts_decimals_to_floats() {
        let summary = listing_row().into_summary(vec![]).expect("summary");
        assert!((summary.rating.expect("rating") - 4.5).abs() < 1e-9);
        let coord = summary.coord().expect("coordinate");
        assert!((coord.lat - 48.8534).abs() < 1e-9);
        assert!((coord.lon - 2.3795).abs() < 1e-9);
    }

    #[test]
    fn listing_row_without_address_has_none() {
        let mut row = listing_row();
        row.address_id = None;
        row.street = None;
        row.postal_code = None;
        row.city = None;
        let summary = row.into_summary(vec![]).expect("summary");
        assert!(summary.address.is_none());
    }

    #[test]
    fn listing_row_rejects_unknown_status() {
        let mut row = listing_row();
        row.status = "closed".to_string();
        assert!(matches!(
            row.into_summary(vec![]),
            Err(CoreError::InvalidStatus(_))
        ));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(RestaurantUpdate::default().is_empty());
        let update = RestaurantUpdate {
            rating: Some(Decimal::new(3, 0)),
            ..RestaurantUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
