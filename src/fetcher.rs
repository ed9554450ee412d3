use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use futures::FutureExt;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, FeedCache};
use crate::dates;
use crate::error::{panic_message, FetchError};
use crate::models::FeedItem;
use crate::sanitize;

pub const DEFAULT_TITLE: &str = "No title";
pub const DEFAULT_LINK: &str = "#";

/// Largest feed body read before giving up on a source.
pub const DEFAULT_MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

/// Entry fields as they came out of the feed, before cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>,
}

/// Where feed documents come from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Load and parse the feed at `url`. Malformed documents are an error.
    async fn load(&self, url: &str) -> Result<Vec<RawEntry>, FetchError>;
}

/// Fetches feeds over HTTP and parses them with feed-rs.
pub struct HttpFeedSource {
    client: Client,
    max_bytes: usize,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("RandomNews/1.0 (Feed Preview)")
            .build()?;

        Ok(Self {
            client,
            max_bytes: DEFAULT_MAX_FEED_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn parse_entries(bytes: &[u8]) -> Result<Vec<RawEntry>, FetchError> {
        let feed = parser::parse(bytes)?;
        Ok(feed.entries.into_iter().map(Self::raw_entry).collect())
    }

    fn raw_entry(entry: feed_rs::model::Entry) -> RawEntry {
        let title = entry
            .title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty());

        let link = entry
            .links
            .into_iter()
            .map(|l| l.href)
            .find(|href| !href.trim().is_empty());

        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        let published = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.to_rfc3339());

        RawEntry {
            title,
            link,
            summary,
            published,
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn load(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
        info!("Fetching feed: {}", url);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(FetchError::TooLarge(self.max_bytes));
            }
        }

        // The declared length can be missing or wrong, so count while reading
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge(self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Self::parse_entries(&body)
    }
}

/// Anything that can turn a feed URL into items without failing.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch(&self, url: &str, count: usize) -> Vec<FeedItem>;
}

/// Turns feed URLs into cleaned item samples, caching valid results.
pub struct Fetcher {
    source: Arc<dyn FeedSource>,
    cache: FeedCache,
}

impl Fetcher {
    pub fn new(source: Arc<dyn FeedSource>, cache: FeedCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Return up to `count` random items from the feed at `url`.
    ///
    /// Failures, panics in the source or parser included, are logged and
    /// yield an empty list; only successful fetches are cached.
    pub async fn fetch(&self, url: &str, count: usize) -> Vec<FeedItem> {
        let key = CacheKey::new(url, count);
        if let Some(items) = self.cache.get(&key).await {
            debug!("Cache hit for {}", url);
            return items;
        }

        let outcome = AssertUnwindSafe(self.fetch_uncached(url, count))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(FetchError::Panicked(panic_message(panic.as_ref()).to_string()))
            });

        match outcome {
            Ok(items) => {
                info!("Loaded {} items from {}", items.len(), url);
                self.cache.insert(key, items.clone()).await;
                items
            }
            Err(e) => {
                warn!("Failed to fetch feed '{}': {}", url, e);
                Vec::new()
            }
        }
    }

    async fn fetch_uncached(&self, url: &str, count: usize) -> Result<Vec<FeedItem>, FetchError> {
        let entries = self.source.load(url).await?;
        if entries.is_empty() {
            return Err(FetchError::Empty);
        }

        let selected = sample_entries(entries, count, &mut rand::thread_rng());
        Ok(selected.into_iter().map(build_item).collect())
    }
}

#[async_trait]
impl ItemFetcher for Fetcher {
    async fn fetch(&self, url: &str, count: usize) -> Vec<FeedItem> {
        Fetcher::fetch(self, url, count).await
    }
}

/// Uniformly choose `count` entries without replacement, or all of them when
/// there are not more than `count`.
pub fn sample_entries<R: Rng + ?Sized>(
    mut entries: Vec<RawEntry>,
    count: usize,
    rng: &mut R,
) -> Vec<RawEntry> {
    if entries.len() > count {
        entries.shuffle(rng);
        entries.truncate(count);
    }
    entries
}

pub fn build_item(entry: RawEntry) -> FeedItem {
    let title = entry
        .title
        .map(|t| sanitize::collapse_whitespace(&sanitize::strip_markup(&t)))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    FeedItem {
        title,
        link: entry.link.unwrap_or_else(|| DEFAULT_LINK.to_string()),
        preview: sanitize::clean(entry.summary.as_deref().unwrap_or("")),
        published: dates::normalize(entry.published.as_deref().unwrap_or("")),
    }
}
