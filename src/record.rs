//! Marquee - Record field resolution
//!
//! Movie dumps in the wild disagree on key names for the same concept, so
//! every interesting field is resolved through an ordered candidate list.
//! All helpers here are total functions over arbitrary JSON values.

use serde_json::Value;

/// Identifier candidate keys, in priority order.
pub const ID_FIELDS: [&str; 6] = ["id", "movieId", "_id", "imdb_id", "imdbId", "tmdb_id"];

/// Rating candidate keys, in priority order.
pub const RATING_FIELDS: [&str; 3] = ["vote_average", "vote", "voteAverage"];

/// Display-title candidate keys, in priority order.
pub const TITLE_FIELDS: [&str; 2] = ["title", "original_title"];

/// Resolve the first present value among `candidates` on a record.
///
/// A field counts as present when the key exists and its value is not JSON
/// null. Non-object records resolve nothing.
pub fn resolve_field<'a>(record: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    let obj = record.as_object()?;
    candidates
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
}

/// Resolve a record's canonical identifier.
pub fn resolve_id(record: &Value) -> Option<&Value> {
    resolve_field(record, &ID_FIELDS)
}

/// Render an identifier value the way URL path segments compare: strings
/// stay bare, everything else uses its JSON rendering.
pub fn id_as_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a raw rating value onto the 0-10 scale with one decimal digit.
///
/// Absent and non-numeric inputs coerce to 0. Values above 10 are assumed
/// to be on a 0-100 scale and divided by 10 once. Rounding is half away
/// from zero; negative inputs pass through the same rounding unclamped.
pub fn normalize_rating(value: Option<&Value>) -> f64 {
    let n = value.map(coerce_number).unwrap_or(0.0);
    let n = if n > 10.0 { n / 10.0 } else { n };
    (n * 10.0).round() / 10.0
}

/// Resolve and normalize a record's rating in one step.
pub fn record_rating(record: &Value) -> f64 {
    normalize_rating(resolve_field(record, &RATING_FIELDS))
}

/// Coerce an arbitrary JSON value to a finite f64, defaulting to 0.
fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}
