use std::sync::Arc;

use crate::{corpus::Corpus, db::Cache, services::SearchHistory};

const DEFAULT_CACHE_TTL: u64 = 3600;

/// Shared application state.
///
/// The corpus is read-only for the life of the process, so handlers share it
/// without locking.
#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub history: Arc<dyn SearchHistory>,
    pub cache: Option<Cache>,
    /// Seconds a cached recommend response lives
    pub cache_ttl: u64,
}

impl AppState {
    pub fn new(corpus: Arc<Corpus>, history: Arc<dyn SearchHistory>) -> Self {
        Self {
            corpus,
            history,
            cache: None,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }
}
