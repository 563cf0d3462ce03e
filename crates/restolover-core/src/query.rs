//! Natural-language restaurant search.
//!
//! [`QueryInterpreter::parse`] pulls at most one speciality and one city out
//! of free text using the ordered [`KeywordTables`]; [`route`] then picks the
//! retrieval strategy and the user-facing message. Keywords only match whole
//! words, optionally followed by a plural `s` or `x`, so "pizzas" is found
//! but "lyon" is not found inside "lyonnaise".

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::keywords::KeywordTables;
use crate::restaurants::RestaurantSummary;

/// Structured filters extracted from a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub speciality: Option<String>,
    pub city: Option<String>,
    pub residual_text: Option<String>,
}

impl ParsedQuery {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.speciality.is_none() && self.city.is_none() && self.residual_text.is_none()
    }
}

/// The predicate a restaurant provider must apply. Every variant implies
/// `status = active` and ordering by rating descending, unrated last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestaurantFilter {
    SpecialityAndCity { speciality: String, city: String },
    Speciality { speciality: String },
    City { city: String },
    Text { text: String },
    All,
}

impl RestaurantFilter {
    /// In-memory version of the predicate, including the active-status check.
    #[must_use]
    pub fn matches(&self, restaurant: &RestaurantSummary) -> bool {
        if !restaurant.is_active() {
            return false;
        }
        match self {
            RestaurantFilter::SpecialityAndCity { speciality, city } => {
                in_city(restaurant, city) && has_speciality(restaurant, speciality)
            }
            RestaurantFilter::Speciality { speciality } => has_speciality(restaurant, speciality),
            RestaurantFilter::City { city } => in_city(restaurant, city),
            RestaurantFilter::Text { text } => {
                let needle = text.to_lowercase();
                restaurant.name.to_lowercase().contains(&needle)
                    || restaurant
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
            RestaurantFilter::All => true,
        }
    }
}

fn in_city(restaurant: &RestaurantSummary, city: &str) -> bool {
    restaurant
        .address
        .as_ref()
        .is_some_and(|a| a.city.to_lowercase() == city.to_lowercase())
}

fn has_speciality(restaurant: &RestaurantSummary, speciality: &str) -> bool {
    let needle = speciality.to_lowercase();
    restaurant
        .specialities
        .iter()
        .any(|s| s.name.to_lowercase().contains(&needle))
}

/// The retrieval strategy chosen for a query, with its response message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutePlan {
    pub filter: RestaurantFilter,
    pub message: String,
}

impl RoutePlan {
    /// The plan to run instead when a free-text search matched nothing.
    ///
    /// Only free-text searches degrade to the full listing; an empty
    /// speciality or city result is a legitimate answer.
    #[must_use]
    pub fn fallback(&self) -> Option<RoutePlan> {
        matches!(self.filter, RestaurantFilter::Text { .. })
            .then(|| route(&ParsedQuery::default()))
    }
}

/// Restaurants returned for a chatbot query, with the message to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatbotAnswer {
    pub restaurants: Vec<RestaurantSummary>,
    pub message: String,
}

/// Runs `plan` against an in-memory snapshot, applying the free-text fallback.
#[must_use]
pub fn answer_from_snapshot(plan: &RoutePlan, snapshot: &[RestaurantSummary]) -> ChatbotAnswer {
    let restaurants = apply_filter(&plan.filter, snapshot.iter().cloned());
    if restaurants.is_empty() {
        if let Some(fallback) = plan.fallback() {
            return ChatbotAnswer {
                restaurants: apply_filter(&fallback.filter, snapshot.iter().cloned()),
                message: fallback.message,
            };
        }
    }
    ChatbotAnswer {
        restaurants,
        message: plan.message.clone(),
    }
}

/// Parses free text against a borrowed, immutable keyword vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct QueryInterpreter<'a> {
    tables: &'a KeywordTables,
}

impl<'a> QueryInterpreter<'a> {
    #[must_use]
    pub fn new(tables: &'a KeywordTables) -> Self {
        Self { tables }
    }

    /// Extracts speciality, city and leftover text from `text`.
    ///
    /// Never fails: unrecognized input ends up in `residual_text`, and empty
    /// input yields an all-empty [`ParsedQuery`].
    #[must_use]
    pub fn parse(&self, text: &str) -> ParsedQuery {
        let normalized = text.trim().to_lowercase();
        let mut working = normalized.clone();

        let speciality = self
            .tables
            .specialities()
            .iter()
            .find(|entry| find_word(&normalized, &entry.keyword).is_some())
            .map(|entry| {
                working = remove_word(&working, &entry.keyword);
                entry.canonical.clone()
            });

        let city = self
            .tables
            .cities()
            .iter()
            .find(|city| find_word(&normalized, city).is_some())
            .map(|city| {
                working = remove_word(&working, city);
                capitalize_first(city)
            });

        let residual = working.split_whitespace().collect::<Vec<_>>().join(" ");

        ParsedQuery {
            speciality,
            city,
            residual_text: (!residual.is_empty()).then_some(residual),
        }
    }

    /// Parses `text` and routes the result in one step.
    #[must_use]
    pub fn interpret(&self, text: &str) -> (ParsedQuery, RoutePlan) {
        let parsed = self.parse(text);
        let plan = route(&parsed);
        (parsed, plan)
    }
}

/// Chooses the retrieval strategy for a parsed query.
///
/// Priority: speciality and city, speciality, city, residual text, everything.
#[must_use]
pub fn route(query: &ParsedQuery) -> RoutePlan {
    match (&query.speciality, &query.city, &query.residual_text) {
        (Some(speciality), Some(city), _) => RoutePlan {
            message: format!("Voici les restaurants {speciality} à {city}"),
            filter: RestaurantFilter::SpecialityAndCity {
                speciality: speciality.clone(),
                city: city.clone(),
            },
        },
        (Some(speciality), None, _) => RoutePlan {
            message: format!("Voici tous les restaurants {speciality}"),
            filter: RestaurantFilter::Speciality {
                speciality: speciality.clone(),
            },
        },
        (None, Some(city), _) => RoutePlan {
            message: format!("Voici tous les restaurants à {city}"),
            filter: RestaurantFilter::City { city: city.clone() },
        },
        (None, None, Some(text)) => RoutePlan {
            message: format!("Résultats pour \"{text}\""),
            filter: RestaurantFilter::Text { text: text.clone() },
        },
        (None, None, None) => RoutePlan {
            message: "Voici tous les restaurants disponibles".to_string(),
            filter: RestaurantFilter::All,
        },
    }
}

/// Applies `filter` to an in-memory snapshot and orders the matches by
/// rating descending (unrated last), then by id.
#[must_use]
pub fn apply_filter<I>(filter: &RestaurantFilter, restaurants: I) -> Vec<RestaurantSummary>
where
    I: IntoIterator<Item = RestaurantSummary>,
{
    let mut matched: Vec<RestaurantSummary> = restaurants
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect();
    matched.sort_by(rating_order);
    matched
}

fn rating_order(a: &RestaurantSummary, b: &RestaurantSummary) -> Ordering {
    let by_rating = match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rating.then_with(|| a.id.cmp(&b.id))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

fn is_plural_suffix(c: char) -> bool {
    matches!(c, 's' | 'x')
}

/// Byte ranges of `needle` in `haystack` that are not part of a longer word.
///
/// A single trailing `s` or `x` is accepted as a plural inflection and is
/// included in the range, so "pizza" covers all of "pizzas".
fn word_ranges<'h>(
    haystack: &'h str,
    needle: &'h str,
) -> impl Iterator<Item = (usize, usize)> + 'h {
    haystack
        .match_indices(needle)
        .filter_map(move |(start, m)| {
            let before = haystack[..start].chars().next_back();
            if before.is_some_and(is_word_char) {
                return None;
            }
            let end = start + m.len();
            let mut rest = haystack[end..].chars();
            match rest.next() {
                None => Some((start, end)),
                Some(c) if !is_word_char(c) => Some((start, end)),
                Some(c) if is_plural_suffix(c) && rest.next().is_none_or(|n| !is_word_char(n)) => {
                    Some((start, end + c.len_utf8()))
                }
                Some(_) => None,
            }
        })
}

fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    word_ranges(haystack, needle).next().map(|(start, _)| start)
}

fn remove_word(text: &str, needle: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in word_ranges(text, needle) {
        out.push_str(&text[last..start]);
        out.push(' ');
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
