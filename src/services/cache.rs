use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::{DistanceResult, TransportMode};

/// Cache key for distance estimates: (origin, destination, mode)
pub type DistanceKey = (String, String, TransportMode);

/// Process-lifetime cache for distance estimates
///
/// Append-only; the key space is bounded by the postal-code pairs actually
/// queried, so no eviction is needed. Mutation is mutex-guarded so the
/// estimator can be shared across request handlers.
#[derive(Debug, Default)]
pub struct DistanceCache {
    inner: Mutex<HashMap<DistanceKey, DistanceResult>>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, origin: &str, destination: &str, mode: TransportMode) -> Option<DistanceResult> {
        let key = (origin.to_string(), destination.to_string(), mode);
        self.inner.lock().ok()?.get(&key).cloned()
    }

    pub fn put(&self, origin: &str, destination: &str, mode: TransportMode, result: DistanceResult) {
        let key = (origin.to_string(), destination.to_string(), mode);
        if let Ok(mut map) = self.inner.lock() {
            map.insert(key, result);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-text embedding cache, keyed by (text, model)
///
/// In-memory tier backed by moka; optionally persisted to a JSON file so the
/// cache survives process restarts. The snapshot is rewritten on every insert.
/// Disk writes are best-effort: a failed write is logged, never fatal.
pub struct EmbeddingCache {
    mem: moka::sync::Cache<String, Arc<Vec<f64>>>,
    path: Option<PathBuf>,
}

impl EmbeddingCache {
    /// In-memory only cache
    pub fn new(capacity: u64) -> Self {
        Self {
            mem: moka::sync::Cache::new(capacity),
            path: None,
        }
    }

    /// Cache persisted at `path`; loads any existing snapshot
    pub fn with_persistence<P: AsRef<Path>>(capacity: u64, path: P) -> Self {
        let cache = Self {
            mem: moka::sync::Cache::new(capacity),
            path: Some(path.as_ref().to_path_buf()),
        };
        cache.load();
        cache
    }

    fn key(text: &str, model: &str) -> String {
        format!("{}\u{1f}{}", model, text)
    }

    pub fn get(&self, text: &str, model: &str) -> Option<Arc<Vec<f64>>> {
        self.mem.get(&Self::key(text, model))
    }

    pub fn put(&self, text: &str, model: &str, embedding: Vec<f64>) {
        self.mem.insert(Self::key(text, model), Arc::new(embedding));
        // Snapshot after every insert so the cache survives restarts
        if self.path.is_some() {
            self.persist();
        }
    }

    pub fn len(&self) -> u64 {
        self.mem.run_pending_tasks();
        self.mem.entry_count()
    }

    /// Load the persisted snapshot, if any
    fn load(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if !path.exists() {
            return;
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<HashMap<String, Vec<f64>>>(&json) {
                Ok(entries) => {
                    let count = entries.len();
                    for (key, embedding) in entries {
                        self.mem.insert(key, Arc::new(embedding));
                    }
                    tracing::debug!("Loaded {} cached embeddings from {:?}", count, path);
                }
                Err(e) => {
                    tracing::warn!("Could not parse embedding cache {:?}: {}", path, e);
                }
            },
            Err(e) => {
                tracing::warn!("Could not read embedding cache {:?}: {}", path, e);
            }
        }
    }

    /// Write the current cache contents to disk. Best-effort.
    pub fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        self.mem.run_pending_tasks();
        let snapshot: HashMap<String, Vec<f64>> = self
            .mem
            .iter()
            .map(|(key, embedding)| ((*key).clone(), (*embedding).clone()))
            .collect();

        let result = serde_json::to_string(&snapshot).map_err(std::io::Error::other).and_then(|json| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)
        });

        if let Err(e) = result {
            tracing::warn!("Could not save embedding cache to {:?}: {}", path, e);
        }
    }
}
