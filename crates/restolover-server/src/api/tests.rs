use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use restolover_db::{NewAddress, NewRestaurant};
use rust_decimal::Decimal;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn test_state(pool: PgPool, geocoder_url: &str) -> AppState {
    AppState {
        pool,
        keywords: Arc::new(KeywordTables::builtin()),
        geocoder: GeocoderClient::with_base_url(2, geocoder_url).expect("geocoder client"),
        nearby: NearbySettings::default(),
    }
}

fn test_app(pool: PgPool) -> Router {
    test_app_with_geocoder(pool, "http://127.0.0.1:9")
}

fn test_app_with_geocoder(pool: PgPool, geocoder_url: &str) -> Router {
    let auth = AuthState::from_keys(API_KEY, false).expect("auth");
    build_app(
        test_state(pool, geocoder_url),
        auth,
        RateLimitState::new(120, std::time::Duration::from_secs(60)),
        &["http://localhost:3000".to_string()],
    )
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    read_json(response).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: &serde_json::Value,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app
        .oneshot(
            builder
                .body(Body::from(serde_json::to_vec(body).expect("encode")))
                .expect("request"),
        )
        .await
        .expect("response");
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

/// Seeds a restaurant in `city` at the given position with one speciality.
async fn seed_restaurant(
    pool: &PgPool,
    name: &str,
    city: &str,
    position: (f64, f64),
    speciality_id: i64,
    rating: Option<Decimal>,
) -> i64 {
    let address = restolover_db::create_address(
        pool,
        &NewAddress {
            street: "Rue de test".to_string(),
            postal_code: "69001".to_string(),
            city: city.to_string(),
            latitude: Some(position.0),
            longitude: Some(position.1),
            ..NewAddress::default()
        },
    )
    .await
    .expect("insert address");

    restolover_db::create_restaurant(
        pool,
        &NewRestaurant {
            name: name.to_string(),
            rating,
            address_id: Some(address.id),
            speciality_ids: vec![speciality_id],
            ..NewRestaurant::default()
        },
    )
    .await
    .expect("insert restaurant")
    .id
}

fn names(json: &serde_json::Value) -> Vec<String> {
    json.as_array()
        .expect("array")
        .iter()
        .map(|r| r["name"].as_str().expect("name").to_string())
        .collect()
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("location_required", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("conflict", StatusCode::CONFLICT),
        ("upstream_error", StatusCode::BAD_GATEWAY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[test]
fn map_db_error_classifies_client_errors() {
    assert_eq!(
        map_db_error("r", &DbError::NotFound, "restaurant 7")
            .error
            .message,
        "restaurant 7 not found"
    );
    assert_eq!(
        map_db_error("r", &DbError::Conflict("taken".into()), "x").error.code,
        "conflict"
    );
    assert_eq!(
        map_db_error("r", &DbError::InvalidReference("gone".into()), "x")
            .error
            .code,
        "validation_error"
    );
    assert_eq!(
        map_db_error("r", &DbError::MissingDatabaseUrl, "x").error.code,
        "internal_error"
    );
}

#[test]
fn parse_id_rejects_non_numeric_segments() {
    assert_eq!(parse_id("r", "42", "restaurant").expect("id"), 42);
    assert_eq!(
        parse_id("r", "abc", "restaurant").unwrap_err().error.code,
        "not_found"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_database_ok(pool: PgPool) {
    let (status, json) = get_json(test_app(pool), "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn chatbot_filters_by_speciality_and_city(pool: PgPool) {
    let italien = restolover_db::create_speciality(&pool, "Italien")
        .await
        .expect("speciality");
    let japonais = restolover_db::create_speciality(&pool, "Japonais")
        .await
        .expect("speciality");
    seed_restaurant(&pool, "Da Luigi", "Lyon", (45.76, 4.83), italien.id, Some(Decimal::new(40, 1))).await;
    seed_restaurant(&pool, "Pizzeria Roma", "Lyon", (45.75, 4.84), italien.id, Some(Decimal::new(45, 1))).await;
    seed_restaurant(&pool, "Sakura", "Lyon", (45.76, 4.85), japonais.id, None).await;
    seed_restaurant(&pool, "Vesuvio", "Marseille", (43.30, 5.37), italien.id, None).await;

    let (status, json) = get_json(
        test_app(pool),
        "/api/v1/restaurants/chatbot?q=pizza%20lyon",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["message"], "Voici les restaurants Italien à Lyon");
    assert_eq!(data["parsed"]["speciality"], "Italien");
    assert_eq!(data["parsed"]["city"], "Lyon");
    assert_eq!(names(&data["restaurants"]), ["Pizzeria Roma", "Da Luigi"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn chatbot_unmatched_text_falls_back_to_all(pool: PgPool) {
    let italien = restolover_db::create_speciality(&pool, "Italien")
        .await
        .expect("speciality");
    seed_restaurant(&pool, "Da Luigi", "Lyon", (45.76, 4.83), italien.id, None).await;

    let (status, json) = get_json(test_app(pool), "/api/v1/restaurants/chatbot?q=xyzzy").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["parsed"]["residual_text"], "xyzzy");
    assert_eq!(
        json["data"]["message"],
        "Voici tous les restaurants disponibles"
    );
    assert_eq!(names(&json["data"]["restaurants"]), ["Da Luigi"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn nearby_requires_a_position(pool: PgPool) {
    let (status, json) = get_json(test_app(pool), "/api/v1/restaurants/nearby?lat=45.76").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "location_required");
}

#[sqlx::test(migrations = "../../migrations")]
async fn nearby_returns_closest_first_within_radius(pool: PgPool) {
    let italien = restolover_db::create_speciality(&pool, "Italien")
        .await
        .expect("speciality");
    seed_restaurant(&pool, "Farther", "Lyon", (45.7700, 4.8320), italien.id, None).await;
    seed_restaurant(&pool, "Closer", "Lyon", (45.7580, 4.8320), italien.id, None).await;
    seed_restaurant(&pool, "Marseille", "Marseille", (43.2965, 5.3698), italien.id, None).await;

    let (status, json) = get_json(
        test_app(pool),
        "/api/v1/restaurants/nearby?lat=45.7578&lon=4.8320&radius_m=3000",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let hits = json["data"]["restaurants"].as_array().expect("array");
    let hit_names: Vec<&str> = hits
        .iter()
        .map(|h| h["restaurant"]["name"].as_str().expect("name"))
        .collect();
    assert_eq!(hit_names, ["Closer", "Farther"]);
    assert!(hits[0]["distance_m"].as_f64().expect("distance") < 100.0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn nearby_leaves_out_deactivated_restaurants(pool: PgPool) {
    let italien = restolover_db::create_speciality(&pool, "Italien")
        .await
        .expect("speciality");
    seed_restaurant(&pool, "Ouvert", "Lyon", (45.7580, 4.8320), italien.id, None).await;
    let closed = seed_restaurant(&pool, "Ferme", "Lyon", (45.7580, 4.8320), italien.id, None).await;

    let (status, _) = send_json(
        test_app(pool.clone()),
        Method::DELETE,
        &format!("/api/v1/restaurants/{closed}"),
        &serde_json::json!({}),
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get_json(
        test_app(pool),
        "/api/v1/restaurants/nearby?lat=45.7578&lon=4.8320&radius_m=1000",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hits = json["data"]["restaurants"].as_array().expect("array");
    let hit_names: Vec<&str> = hits
        .iter()
        .map(|h| h["restaurant"]["name"].as_str().expect("name"))
        .collect();
    assert_eq!(hit_names, ["Ouvert"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn writes_require_bearer_token(pool: PgPool) {
    let body = serde_json::json!({ "name": "Chez Paul" });

    let (status, json) = send_json(
        test_app(pool.clone()),
        Method::POST,
        "/api/v1/restaurants",
        &body,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let (status, json) = send_json(
        test_app(pool),
        Method::POST,
        "/api/v1/restaurants",
        &body,
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["name"], "Chez Paul");
    assert_eq!(json["data"]["status"], "active");
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleted_restaurant_leaves_listings(pool: PgPool) {
    let italien = restolover_db::create_speciality(&pool, "Italien")
        .await
        .expect("speciality");
    let id = seed_restaurant(&pool, "Da Luigi", "Lyon", (45.76, 4.83), italien.id, None).await;

    let (status, _) = send_json(
        test_app(pool.clone()),
        Method::DELETE,
        &format!("/api/v1/restaurants/{id}"),
        &serde_json::json!({}),
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = get_json(test_app(pool.clone()), "/api/v1/restaurants").await;
    assert!(names(&json["data"]).is_empty());

    let (status, json) = get_json(test_app(pool), &format!("/api/v1/restaurants/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "inactive");
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_rejects_out_of_range_rating(pool: PgPool) {
    let italien = restolover_db::create_speciality(&pool, "Italien")
        .await
        .expect("speciality");
    let id = seed_restaurant(&pool, "Da Luigi", "Lyon", (45.76, 4.83), italien.id, None).await;

    let (status, json) = send_json(
        test_app(pool),
        Method::PATCH,
        &format!("/api/v1/restaurants/{id}"),
        &serde_json::json!({ "rating": 7.5 }),
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_restaurant_is_not_found(pool: PgPool) {
    let (status, json) = get_json(test_app(pool), "/api/v1/restaurants/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_speciality_is_conflict(pool: PgPool) {
    let body = serde_json::json!({ "name": "Libanais" });
    let (status, _) = send_json(
        test_app(pool.clone()),
        Method::POST,
        "/api/v1/specialities",
        &body,
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send_json(
        test_app(pool),
        Method::POST,
        "/api/v1/specialities",
        &body,
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}

#[sqlx::test(migrations = "../../migrations")]
async fn geocode_proxies_feature_collection(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("q", "place bellecour"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [4.832, 45.7578] },
                "properties": {
                    "label": "Place Bellecour 69002 Lyon",
                    "name": "Place Bellecour",
                    "postcode": "69002",
                    "city": "Lyon"
                }
            }]
        })))
        .mount(&server)
        .await;

    let (status, json) = get_json(
        test_app_with_geocoder(pool, &server.uri()),
        "/api/v1/addresses/geocode?q=place%20bellecour",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["data"][0]["properties"]["label"],
        "Place Bellecour 69002 Lyon"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn geocoder_failure_is_upstream_error(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, json) = get_json(
        test_app_with_geocoder(pool, &server.uri()),
        "/api/v1/addresses/geocode?q=lyon",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "upstream_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn address_from_feature_is_stored(pool: PgPool) {
    let body = serde_json::json!({
        "feature": {
            "geometry": { "coordinates": [4.8357, 45.7640] },
            "properties": {
                "label": "12 Rue de la République 69002 Lyon",
                "housenumber": "12",
                "street": "Rue de la République",
                "postcode": "69002",
                "citycode": "69382",
                "city": "Lyon"
            }
        }
    });

    let (status, json) = send_json(
        test_app(pool.clone()),
        Method::POST,
        "/api/v1/addresses/from-feature",
        &body,
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["house_number"], "12");
    assert_eq!(json["data"]["insee_code"], "69382");
    let lat = json["data"]["latitude"].as_f64().expect("latitude");
    assert!((lat - 45.764).abs() < 1e-6);

    let (_, json) = get_json(test_app(pool), "/api/v1/addresses/cities").await;
    assert_eq!(json["data"][0]["city"], "Lyon");
    assert_eq!(json["data"][0]["departement_code"], "69");
}
