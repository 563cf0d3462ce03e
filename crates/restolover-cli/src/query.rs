//! Query command handlers: `parse`, `chat` and `nearby`.

use std::path::Path;

use restolover_core::{
    filter_nearby, load_keyword_tables, Coord, KeywordTables, ParsedQuery, QueryInterpreter,
    RestaurantSummary, RoutePlan,
};

/// Keyword tables from the YAML override at `path`, or the built-in ones.
///
/// # Errors
///
/// Returns an error if the override file cannot be read or is invalid.
pub(crate) fn keyword_tables(path: Option<&Path>) -> anyhow::Result<KeywordTables> {
    match path {
        Some(path) => {
            let tables = load_keyword_tables(path)?;
            tracing::info!(path = %path.display(), "loaded keyword tables override");
            Ok(tables)
        }
        None => Ok(KeywordTables::builtin()),
    }
}

pub(crate) fn interpretation_json(parsed: &ParsedQuery, plan: &RoutePlan) -> serde_json::Value {
    serde_json::json!({
        "parsed": parsed,
        "filter": plan.filter,
        "message": plan.message,
    })
}

/// Print how `text` is parsed and routed.
///
/// # Errors
///
/// Returns an error if the interpretation cannot be serialized.
pub(crate) fn run_parse(tables: &KeywordTables, text: &str) -> anyhow::Result<()> {
    let (parsed, plan) = QueryInterpreter::new(tables).interpret(text);
    println!(
        "{}",
        serde_json::to_string_pretty(&interpretation_json(&parsed, &plan))?
    );
    Ok(())
}

fn fmt_rating(rating: Option<f64>) -> String {
    rating.map_or_else(|| "\u{2014}".to_string(), |r| format!("{r:.1}"))
}

fn fmt_city(restaurant: &RestaurantSummary) -> &str {
    restaurant
        .address
        .as_ref()
        .map_or("\u{2014}", |a| a.city.as_str())
}

fn fmt_distance(distance_m: f64) -> String {
    if distance_m < 1_000.0 {
        format!("{distance_m:.0} m")
    } else {
        format!("{:.1} km", distance_m / 1_000.0)
    }
}

/// Answer `text` like the chatbot endpoint does and print the restaurants.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_chat(
    pool: &sqlx::PgPool,
    tables: &KeywordTables,
    text: &str,
) -> anyhow::Result<()> {
    let (_, plan) = QueryInterpreter::new(tables).interpret(text);
    let answer = restolover_db::answer_query(pool, &plan).await?;

    println!("{}", answer.message);
    if answer.restaurants.is_empty() {
        println!("no restaurants found");
        return Ok(());
    }

    println!("{:<8}{:<32}{:<20}RATING", "ID", "NAME", "CITY");
    for restaurant in &answer.restaurants {
        println!(
            "{:<8}{:<32}{:<20}{}",
            restaurant.id,
            restaurant.name,
            fmt_city(restaurant),
            fmt_rating(restaurant.rating)
        );
    }
    Ok(())
}

/// Print active restaurants within `radius_m` of the position, nearest first.
///
/// # Errors
///
/// Returns an error if the position is invalid or the database query fails.
pub(crate) async fn run_nearby(
    pool: &sqlx::PgPool,
    lat: f64,
    lon: f64,
    radius_m: f64,
) -> anyhow::Result<()> {
    let reference = Coord::checked(lat, lon)?;
    if !radius_m.is_finite() || radius_m <= 0.0 {
        anyhow::bail!("radius must be a positive number of meters, got {radius_m}");
    }

    let candidates = restolover_db::list_active_restaurants(pool).await?;
    let nearby = filter_nearby(reference, &candidates, radius_m);

    if nearby.is_empty() {
        println!("no restaurants within {}", fmt_distance(radius_m));
        return Ok(());
    }

    println!("{:<12}{:<8}{:<32}CITY", "DISTANCE", "ID", "NAME");
    for hit in &nearby {
        println!(
            "{:<12}{:<8}{:<32}{}",
            fmt_distance(hit.distance_m),
            hit.restaurant.id,
            hit.restaurant.name,
            fmt_city(&hit.restaurant)
        );
    }
    Ok(())
}
