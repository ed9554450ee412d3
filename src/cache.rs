use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::models::FeedItem;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CAPACITY: usize = 100;

/// Feed URL plus the number of items requested from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub count: usize,
}

impl CacheKey {
    pub fn new(url: &str, count: usize) -> Self {
        Self {
            url: url.to_string(),
            count,
        }
    }
}

struct CacheEntry {
    items: Vec<FeedItem>,
    inserted_at: Instant,
}

/// Bounded store of recently built item lists.
///
/// Entries expire `ttl` after insertion. Expiry is checked when reading and
/// expired entries are swept when writing; once `capacity` is reached the
/// oldest insertion is evicted.
pub struct FeedCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl FeedCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Vec<FeedItem>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            debug!("Cache entry for {} expired", key.url);
            return None;
        }
        Some(entry.items.clone())
    }

    pub async fn insert(&self, key: CacheKey, items: Vec<FeedItem>) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        let ttl = self.ttl;
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!("Cache full, evicting {}", oldest.url);
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                items,
                inserted_at: now,
            },
        );
    }

    /// Number of stored entries, expired ones included until the next write.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}
