use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Searches consulted by the for-you feed
pub const HISTORY_LIMIT: usize = 3;

/// Per-user record of searched titles.
///
/// Implementations absorb their own storage failures: reads fall back to an
/// empty list and writes report `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchHistory: Send + Sync {
    /// Most recent searches first, at most `limit` titles
    async fn recent_searches(&self, user_id: i64, limit: usize) -> Vec<String>;

    async fn add_search(&self, user_id: i64, movie_title: &str) -> bool;
}

#[derive(Debug, Clone)]
struct SearchEntry {
    movie_title: String,
    searched_at: DateTime<Utc>,
}

/// Process-local history used when no database is configured
#[derive(Debug, Default)]
pub struct InMemorySearchHistory {
    entries: RwLock<HashMap<i64, Vec<SearchEntry>>>,
}

impl InMemorySearchHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchHistory for InMemorySearchHistory {
    async fn recent_searches(&self, user_id: i64, limit: usize) -> Vec<String> {
        let entries = self.entries.read().await;
        let Some(user_entries) = entries.get(&user_id) else {
            return Vec::new();
        };

        let mut sorted: Vec<&SearchEntry> = user_entries.iter().collect();
        // Stable sort keeps insertion order for equal timestamps; reversed below.
        sorted.sort_by_key(|entry| entry.searched_at);
        sorted
            .into_iter()
            .rev()
            .take(limit)
            .map(|entry| entry.movie_title.clone())
            .collect()
    }

    async fn add_search(&self, user_id: i64, movie_title: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.entry(user_id).or_default().push(SearchEntry {
            movie_title: movie_title.to_string(),
            searched_at: Utc::now(),
        });
        tracing::debug!(user_id, movie_title, "Search recorded");
        true
    }
}
