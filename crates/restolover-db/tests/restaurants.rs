//! Database-backed tests for restaurant, speciality and address queries.
//! Each test gets a fresh database from `sqlx::test`.

use restolover_core::{route, KeywordTables, ParsedQuery, RestaurantFilter, RestaurantStatus};
use restolover_db::{
    answer_query, create_address, create_restaurant, create_speciality, deactivate_restaurant,
    delete_speciality, get_restaurant, list_active_restaurants, list_cities, list_restaurants,
    list_restaurants_by_speciality_id, list_specialities, rename_speciality, search_restaurants,
    seed_specialities, update_restaurant, DbError, NewAddress, NewRestaurant, RestaurantUpdate,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

struct Fixture {
    sakura: i64,
    tokyo: i64,
    luigi: i64,
    closed: i64,
    japonais: i64,
}

async fn address(pool: &PgPool, city: &str, lat: f64, lon: f64) -> i64 {
    create_address(
        pool,
        &NewAddress {
            street: "Rue de la République".to_string(),
            postal_code: "69002".to_string(),
            city: city.to_string(),
            latitude: Some(lat),
            longitude: Some(lon),
            ..NewAddress::default()
        },
    )
    .await
    .expect("create address")
    .id
}

async fn restaurant(
    pool: &PgPool,
    name: &str,
    rating: Option<Decimal>,
    address_id: i64,
    speciality_ids: Vec<i64>,
) -> i64 {
    create_restaurant(
        pool,
        &NewRestaurant {
            name: name.to_string(),
            description: Some(format!("{name}, une adresse de quartier")),
            rating,
            address_id: Some(address_id),
            speciality_ids,
        },
    )
    .await
    .expect("create restaurant")
    .id
}

async fn seed(pool: &PgPool) -> Fixture {
    let japonais = create_speciality(pool, "Japonais").await.expect("speciality").id;
    let italien = create_speciality(pool, "Cuisine Italienne")
        .await
        .expect("speciality")
        .id;

    let lyon = address(pool, "Lyon", 45.7640, 4.8357).await;
    let lyon_lower = address(pool, "lyon", 45.7600, 4.8300).await;
    let paris = address(pool, "Paris", 48.8566, 2.3522).await;

    let sakura = restaurant(pool, "Sakura", Some(Decimal::new(41, 1)), lyon, vec![japonais]).await;
    let tokyo = restaurant(pool, "Tokyo Bar", None, lyon_lower, vec![japonais]).await;
    let luigi = restaurant(pool, "Da Luigi", Some(Decimal::new(39, 1)), lyon, vec![italien]).await;
    restaurant(pool, "Kyoto", Some(Decimal::new(48, 1)), paris, vec![japonais]).await;
    let closed = restaurant(pool, "Il Vecchio", Some(Decimal::new(50, 1)), lyon, vec![italien]).await;
    deactivate_restaurant(pool, closed).await.expect("deactivate");

    Fixture {
        sakura,
        tokyo,
        luigi,
        closed,
        japonais,
    }
}

fn names(restaurants: &[restolover_core::RestaurantSummary]) -> Vec<&str> {
    restaurants.iter().map(|r| r.name.as_str()).collect()
}

#[sqlx::test(migrations = "../../migrations")]
async fn speciality_and_city_filter_is_case_insensitive(pool: PgPool) {
    let fixture = seed(&pool).await;
    let result = list_restaurants(
        &pool,
        &RestaurantFilter::SpecialityAndCity {
            speciality: "japonais".to_string(),
            city: "LYON".to_string(),
        },
    )
    .await
    .expect("query");

    let ids: Vec<i64> = result.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![fixture.sakura, fixture.tokyo]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn speciality_filter_matches_substring_and_skips_inactive(pool: PgPool) {
    let fixture = seed(&pool).await;
    let result = list_restaurants(
        &pool,
        &RestaurantFilter::Speciality {
            speciality: "Italien".to_string(),
        },
    )
    .await
    .expect("query");

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, fixture.luigi);
    assert_eq!(result[0].specialities[0].name, "Cuisine Italienne");
}

#[sqlx::test(migrations = "../../migrations")]
async fn all_filter_orders_by_rating_with_unrated_last(pool: PgPool) {
    seed(&pool).await;
    let result = list_restaurants(&pool, &RestaurantFilter::All)
        .await
        .expect("query");
    assert_eq!(names(&result), vec!["Kyoto", "Sakura", "Da Luigi", "Tokyo Bar"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn text_search_matches_name_or_description(pool: PgPool) {
    seed(&pool).await;
    let by_name = search_restaurants(&pool, "SAKU").await.expect("query");
    assert_eq!(names(&by_name), vec!["Sakura"]);

    let by_description = search_restaurants(&pool, "adresse de quartier")
        .await
        .expect("query");
    assert_eq!(by_description.len(), 4);

    let inactive_only = search_restaurants(&pool, "vecchio").await.expect("query");
    assert!(inactive_only.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn text_search_treats_wildcards_literally(pool: PgPool) {
    seed(&pool).await;
    let result = search_restaurants(&pool, "%").await.expect("query");
    assert!(result.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn listing_carries_address_coordinates(pool: PgPool) {
    let fixture = seed(&pool).await;
    let sakura = get_restaurant(&pool, fixture.sakura).await.expect("get");
    let coord = sakura.coord().expect("coordinate");
    assert!((coord.lat - 45.7640).abs() < 1e-6);
    assert!((coord.lon - 4.8357).abs() < 1e-6);
}

#[sqlx::test(migrations = "../../migrations")]
async fn active_restaurants_and_speciality_listing(pool: PgPool) {
    let fixture = seed(&pool).await;
    let active = list_active_restaurants(&pool).await.expect("query");
    assert_eq!(active.len(), 4);
    assert!(active.iter().all(|r| r.status == RestaurantStatus::Active));

    let japanese = list_restaurants_by_speciality_id(&pool, fixture.japonais)
        .await
        .expect("query");
    assert_eq!(names(&japanese), vec!["Kyoto", "Sakura", "Tokyo Bar"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn deactivated_restaurant_is_still_readable(pool: PgPool) {
    let fixture = seed(&pool).await;
    let closed = get_restaurant(&pool, fixture.closed).await.expect("get");
    assert_eq!(closed.status, RestaurantStatus::Inactive);

    let missing = deactivate_restaurant(&pool, 999_999).await;
    assert!(matches!(missing, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_is_sparse_and_replaces_links(pool: PgPool) {
    let fixture = seed(&pool).await;
    let row = update_restaurant(
        &pool,
        fixture.tokyo,
        &RestaurantUpdate {
            rating: Some(Decimal::new(45, 1)),
            speciality_ids: Some(vec![]),
            ..RestaurantUpdate::default()
        },
    )
    .await
    .expect("update");
    assert_eq!(row.name, "Tokyo Bar");
    assert_eq!(row.rating, Some(Decimal::new(450, 2)));

    let tokyo = get_restaurant(&pool, fixture.tokyo).await.expect("get");
    assert!(tokyo.specialities.is_empty());

    let missing = update_restaurant(&pool, 999_999, &RestaurantUpdate::default()).await;
    assert!(matches!(missing, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_with_unknown_speciality_is_rejected(pool: PgPool) {
    let result = create_restaurant(
        &pool,
        &NewRestaurant {
            name: "Orphan".to_string(),
            speciality_ids: vec![424_242],
            ..NewRestaurant::default()
        },
    )
    .await;
    assert!(matches!(result, Err(DbError::InvalidReference(_))));

    let all = list_restaurants(&pool, &RestaurantFilter::All)
        .await
        .expect("query");
    assert!(all.is_empty(), "transaction must roll back");
}

#[sqlx::test(migrations = "../../migrations")]
async fn speciality_names_are_unique(pool: PgPool) {
    create_speciality(&pool, "Thaï").await.expect("create");
    let duplicate = create_speciality(&pool, "Thaï").await;
    assert!(matches!(duplicate, Err(DbError::Conflict(_))));

    let other = create_speciality(&pool, "Grec").await.expect("create");
    let renamed = rename_speciality(&pool, other.id, "Thaï").await;
    assert!(matches!(renamed, Err(DbError::Conflict(_))));

    delete_speciality(&pool, other.id).await.expect("delete");
    let names: Vec<String> = list_specialities(&pool)
        .await
        .expect("list")
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Thaï"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_specialities_is_idempotent(pool: PgPool) {
    let tables = KeywordTables::builtin();
    let expected = tables.canonical_specialities().len();

    let first = seed_specialities(&pool, &tables).await.expect("seed");
    let second = seed_specialities(&pool, &tables).await.expect("seed");
    assert_eq!(first, expected);
    assert_eq!(second, 0);
    assert_eq!(list_specialities(&pool).await.expect("list").len(), expected);
}

#[sqlx::test(migrations = "../../migrations")]
async fn cities_are_grouped_with_department_code(pool: PgPool) {
    seed(&pool).await;
    create_address(
        &pool,
        &NewAddress {
            street: "Quai de Rive Neuve".to_string(),
            postal_code: "13007".to_string(),
            city: "Marseille".to_string(),
            ..NewAddress::default()
        },
    )
    .await
    .expect("create address");

    let cities = list_cities(&pool).await.expect("cities");
    let marseille = cities
        .iter()
        .position(|c| c.city == "Marseille")
        .expect("marseille listed");
    assert_eq!(cities[marseille].departement_code, "13");
    assert_eq!(marseille, 0, "lowest postal code sorts first");
    assert_eq!(cities.iter().filter(|c| c.city == "Lyon").count(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn answer_query_falls_back_only_for_empty_text_search(pool: PgPool) {
    seed(&pool).await;

    let unmatched = route(&ParsedQuery {
        residual_text: Some("xyzzy".to_string()),
        ..ParsedQuery::default()
    });
    let answer = answer_query(&pool, &unmatched).await.expect("query");
    assert_eq!(answer.message, "Voici tous les restaurants disponibles");
    assert_eq!(answer.restaurants.len(), 4);

    let matched = route(&ParsedQuery {
        residual_text: Some("kyoto".to_string()),
        ..ParsedQuery::default()
    });
    let answer = answer_query(&pool, &matched).await.expect("query");
    assert_eq!(answer.message, "Résultats pour \"kyoto\"");
    assert_eq!(names(&answer.restaurants), vec!["Kyoto"]);

    let empty_city = route(&ParsedQuery {
        city: Some("Marseille".to_string()),
        ..ParsedQuery::default()
    });
    let answer = answer_query(&pool, &empty_city).await.expect("query");
    assert!(answer.restaurants.is_empty());
    assert_eq!(answer.message, "Voici tous les restaurants à Marseille");
}
