//! Marquee - Movie catalog API over a static metadata dump.
//!
//! Loads a JSON dataset (array or keyed object) into memory once, then
//! serves paginated summaries and by-id lookups, with field-name fallback
//! and rating normalization smoothing over the dataset's inconsistencies.
//!
//! - **Catalog** (`catalog`) - One-shot memoized dataset loading; a broken
//!   source degrades to an empty catalog instead of a dead process.
//! - **Records** (`record`) - Field resolution and rating normalization
//!   for heterogeneous movie records.
//! - **Lookup** (`service`) - The `list` / `get by id` operations.
//! - **HTTP** (`api`) - Axum router, JSON errors, optional frontend serving.

pub mod api;
pub mod catalog;
pub mod record;
pub mod service;
