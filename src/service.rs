//! Marquee - Movie lookup service
//!
//! The read side of the catalog: paginated list summaries and by-id detail
//! lookups. Both operations are pure reads over the immutable catalog; the
//! only side effect is triggering the initial load.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::CatalogLoader;
use crate::record::{id_as_string, record_rating, resolve_field, resolve_id, TITLE_FIELDS};

/// Page size used when the caller sends nothing usable.
pub const DEFAULT_LIMIT: usize = 50;

/// Hard page-size cap.
pub const MAX_LIMIT: usize = 200;

/// A validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    /// Coerce raw query-string values into a valid window.
    ///
    /// Malformed paging input is never an error: absent, non-numeric, and
    /// non-positive limits fall back to the default, oversized limits clamp
    /// to [`MAX_LIMIT`], and negative offsets clamp to zero. Values are
    /// read with float coercion, so fractions truncate and magnitudes past
    /// the integer range saturate instead of falling back.
    pub fn from_raw(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = match limit.and_then(coerce_index) {
            Some(n) if n >= 1 => n.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };
        let offset = offset.and_then(coerce_index).unwrap_or(0);
        Self { limit, offset }
    }
}

/// Parse a raw query value as a saturating array index. Fractions
/// truncate, negatives and NaN collapse to zero, and values past the
/// integer range pin to `usize::MAX`; input that does not parse as a
/// number at all is `None`.
fn coerce_index(raw: &str) -> Option<usize> {
    let n: f64 = raw.trim().parse().ok()?;
    Some(n as usize)
}

/// Lightweight list-view projection of one record.
#[derive(Debug, Clone, Serialize)]
pub struct MovieSummary {
    pub id: Value,
    pub title: String,
    pub tagline: String,
    pub vote_average: f64,
}

/// One page of the catalog.
#[derive(Debug, Serialize)]
pub struct MovieList {
    pub total: usize,
    pub count: usize,
    pub data: Vec<MovieSummary>,
}

/// Read-only lookup operations over the loaded catalog.
pub struct MovieService {
    loader: CatalogLoader,
}

impl MovieService {
    pub fn new(loader: CatalogLoader) -> Self {
        Self { loader }
    }

    /// Trigger the initial catalog load without answering a query.
    ///
    /// The server calls this at startup so the first request never pays
    /// the parse cost; the loader logs the outcome either way.
    pub async fn warm(&self) {
        self.loader.load().await;
    }

    /// List one page of movie summaries.
    ///
    /// `total` is always the full catalog size; `count` is the number of
    /// records actually returned after slicing.
    pub async fn list(&self, page: Page) -> MovieList {
        let records = self.loader.load().await.records();
        let start = page.offset.min(records.len());
        let end = page.offset.saturating_add(page.limit).min(records.len());
        let data: Vec<MovieSummary> = records[start..end].iter().map(summary_view).collect();
        MovieList {
            total: records.len(),
            count: data.len(),
            data,
        }
    }

    /// Find one movie by identifier, falling back to exact title match.
    ///
    /// The catalog is scanned in order and the first record matching either
    /// rule wins: stringified resolved id equality, then case-insensitive
    /// title equality. The title fallback is a weak heuristic kept for
    /// datasets without usable ids; duplicate titles resolve to the earliest
    /// record. `None` is the expected miss outcome, not an error.
    pub async fn get_by_id(&self, id: &str) -> Option<Value> {
        let records = self.loader.load().await.records();
        let record = records.iter().find(|record| matches_id(record, id))?;
        Some(detail_view(record))
    }
}

/// Per-record match rule: resolved id first, then title.
fn matches_id(record: &Value, wanted: &str) -> bool {
    if let Some(rid) = resolve_id(record) {
        if id_as_string(rid) == wanted {
            return true;
        }
    }
    record
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| title.to_lowercase() == wanted.to_lowercase())
}

/// Project a record down to the list-view fields.
fn summary_view(record: &Value) -> MovieSummary {
    MovieSummary {
        id: resolve_id(record).cloned().unwrap_or(Value::Null),
        title: string_field(record, &TITLE_FIELDS),
        tagline: string_field(record, &["tagline"]),
        vote_average: record_rating(record),
    }
}

/// First candidate field that resolves to a string, else empty.
fn string_field(record: &Value, candidates: &[&str]) -> String {
    resolve_field(record, candidates)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Full-record detail view with `id` and `vote_average` overridden.
///
/// Every other field passes through untouched and in source order,
/// including fields this service knows nothing about.
fn detail_view(record: &Value) -> Value {
    let mut fields = record.as_object().cloned().unwrap_or_else(Map::new);
    fields.insert(
        "id".to_string(),
        resolve_id(record).cloned().unwrap_or(Value::Null),
    );
    fields.insert(
        "vote_average".to_string(),
        Value::from(record_rating(record)),
    );
    Value::Object(fields)
}
