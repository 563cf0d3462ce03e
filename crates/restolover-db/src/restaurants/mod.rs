//! Database operations for the `restaurants` and `restaurant_specialities` tables.

mod read;
mod types;
mod write;

pub use read::{
    answer_query, get_restaurant, list_active_restaurants, list_restaurants,
    list_restaurants_by_speciality_id, search_restaurants,
};
pub use types::{NewRestaurant, RestaurantRow, RestaurantUpdate};
pub use write::{create_restaurant, deactivate_restaurant, update_restaurant};
