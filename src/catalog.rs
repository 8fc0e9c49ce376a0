//! Marquee - Catalog loading
//!
//! Loads the backing movie metadata JSON exactly once and caches the parsed
//! records in memory for the life of the process. There is no reload path;
//! after the first load the catalog is read-only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

/// The full ordered sequence of movie records.
///
/// Ordering matches the source dataset and never changes.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<Value>,
}

impl Catalog {
    /// Normalize a parsed top-level value into the record sequence.
    ///
    /// Arrays are used directly. Keyed objects contribute their values in
    /// document order, for dumps keyed by id. Any other top level has no
    /// sensible record interpretation and yields an empty catalog.
    fn from_value(parsed: Value) -> Self {
        let records = match parsed {
            Value::Array(records) => records,
            Value::Object(map) => map.into_iter().map(|(_, record)| record).collect(),
            _ => {
                warn!("Dataset top level is neither an array nor an object, treating as empty");
                Vec::new()
            }
        };
        Self { records }
    }

    /// Number of records in the catalog.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in source order.
    pub fn records(&self) -> &[Value] {
        &self.records
    }
}

/// Memoized loader for the catalog source file.
///
/// `load` is idempotent and concurrency-safe: callers racing before the
/// first load completes all await the same in-flight read, so the source is
/// read and parsed at most once per process.
pub struct CatalogLoader {
    path: PathBuf,
    loaded: OnceCell<Catalog>,
}

impl CatalogLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            loaded: OnceCell::new(),
        }
    }

    /// Path of the backing dataset, for logs and diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog, or return the cached one.
    ///
    /// An unreadable or unparsable source is logged once and cached as an
    /// empty catalog, so a known-bad source is not retried on every
    /// request. Callers never see the failure.
    pub async fn load(&self) -> &Catalog {
        self.loaded.get_or_init(|| self.read_source()).await
    }

    async fn read_source(&self) -> Catalog {
        match self.try_read().await {
            Ok(catalog) => {
                info!("Loaded {} movies from {}", catalog.len(), self.path.display());
                catalog
            }
            Err(err) => {
                error!(
                    "Failed to load movies from {}: {err:#}. Serving an empty catalog",
                    self.path.display()
                );
                Catalog::default()
            }
        }
    }

    async fn try_read(&self) -> Result<Catalog> {
        let raw = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read dataset: {}", self.path.display()))?;
        let parsed: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse dataset as JSON: {}", self.path.display()))?;
        Ok(Catalog::from_value(parsed))
    }

    /// Build a loader whose catalog is already in place, skipping disk.
    #[cfg(test)]
    pub(crate) fn preloaded(records: Vec<Value>) -> Self {
        Self {
            path: PathBuf::from("<preloaded>"),
            loaded: OnceCell::new_with(Some(Catalog { records })),
        }
    }
}
