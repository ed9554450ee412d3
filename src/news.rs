use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info};

use crate::error::{panic_message, SelectError};
use crate::fetcher::{Fetcher, ItemFetcher};
use crate::models::NewsBatch;
use crate::selector::{Catalog, Selector};

pub const DEFAULT_ITEMS_PER_FEED: usize = 3;

/// Message returned to clients for any failure outside a single feed fetch.
pub const GENERIC_ERROR: &str = "Failed to load news";

/// Picks a feed and returns a random sample of its items.
pub struct NewsService<F = Fetcher> {
    catalog: Arc<Catalog>,
    selector: Selector,
    fetcher: F,
    items_per_feed: usize,
}

impl<F: ItemFetcher> NewsService<F> {
    pub fn new(catalog: Arc<Catalog>, fetcher: F, items_per_feed: usize) -> Self {
        Self {
            catalog,
            selector: Selector::new(),
            fetcher,
            items_per_feed,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Never fails: selection errors and panics that escape the fetcher
    /// become an error batch.
    pub async fn next_batch(&self) -> NewsBatch {
        match AssertUnwindSafe(self.try_next_batch()).catch_unwind().await {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => {
                error!("Failed to select a feed: {}", e);
                NewsBatch::failure(GENERIC_ERROR)
            }
            Err(panic) => {
                error!("News request panicked: {}", panic_message(panic.as_ref()));
                NewsBatch::failure(GENERIC_ERROR)
            }
        }
    }

    async fn try_next_batch(&self) -> Result<NewsBatch, SelectError> {
        let pick = self.selector.pick(&self.catalog)?;
        info!("Picked '{}' from '{}'", pick.source.name, pick.category);

        let items = self
            .fetcher
            .fetch(&pick.source.url, self.items_per_feed)
            .await;

        Ok(NewsBatch::success(pick.category, pick.source.name, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FeedCache;
    use crate::error::FetchError;
    use crate::fetcher::{FeedSource, RawEntry};
    use crate::models::FeedItem;
    use crate::models::BatchStatus;
    use crate::selector::{Category, Source};
    use async_trait::async_trait;

    struct StaticSource(usize);

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn load(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
            Ok((1..=self.0)
                .map(|i| RawEntry {
                    title: Some(format!("{} #{}", url, i)),
                    link: Some(format!("{}/{}", url, i)),
                    ..Default::default()
                })
                .collect())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl FeedSource for FailingSource {
        async fn load(&self, _url: &str) -> Result<Vec<RawEntry>, FetchError> {
            Err(FetchError::Malformed("broken".to_string()))
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl FeedSource for PanickingSource {
        async fn load(&self, _url: &str) -> Result<Vec<RawEntry>, FetchError> {
            panic!("parser exploded");
        }
    }

    /// Fetcher that fails outside any feed source.
    struct PanickingFetcher;

    #[async_trait]
    impl ItemFetcher for PanickingFetcher {
        async fn fetch(&self, _url: &str, _count: usize) -> Vec<FeedItem> {
            panic!("fetcher exploded");
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(vec![
            Category {
                name: "Tech".to_string(),
                sources: vec![
                    Source {
                        name: "Lobsters".to_string(),
                        url: "https://lobste.rs/rss".to_string(),
                    },
                    Source {
                        name: "HN".to_string(),
                        url: "https://news.ycombinator.com/rss".to_string(),
                    },
                ],
            },
            Category {
                name: "General News".to_string(),
                sources: vec![Source {
                    name: "BBC".to_string(),
                    url: "https://feeds.bbci.co.uk/news/rss.xml".to_string(),
                }],
            },
        ]))
    }

    fn service(source: Arc<dyn FeedSource>, catalog: Arc<Catalog>) -> NewsService {
        NewsService::new(
            catalog,
            Fetcher::new(source, FeedCache::default()),
            DEFAULT_ITEMS_PER_FEED,
        )
    }

    #[tokio::test]
    async fn test_successful_batch() {
        let service = service(Arc::new(StaticSource(10)), catalog());

        let batch = service.next_batch().await;

        assert_eq!(batch.status, BatchStatus::Success);
        assert!(batch.error.is_none());
        assert_eq!(batch.items.len(), 3);
        let category = service
            .catalog()
            .categories()
            .iter()
            .find(|c| c.name == batch.category)
            .unwrap();
        let source = category
            .sources
            .iter()
            .find(|s| s.name == batch.feed_name)
            .unwrap();
        for item in &batch.items {
            assert!(item.link.starts_with(&source.url));
        }
    }

    #[tokio::test]
    async fn test_consecutive_batches_differ() {
        let service = service(Arc::new(StaticSource(5)), catalog());

        let mut previous = service.next_batch().await;
        for _ in 0..20 {
            let next = service.next_batch().await;
            assert!(
                next.category != previous.category || next.feed_name != previous.feed_name
            );
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_feed_failure_is_not_an_error_batch() {
        let service = service(Arc::new(FailingSource), catalog());

        let batch = service.next_batch().await;

        assert_eq!(batch.status, BatchStatus::Success);
        assert!(batch.items.is_empty());
        assert!(!batch.category.is_empty());
        assert!(!batch.feed_name.is_empty());
    }

    #[tokio::test]
    async fn test_source_panic_degrades_to_empty_items() {
        let service = service(Arc::new(PanickingSource), catalog());

        let batch = service.next_batch().await;

        assert_eq!(batch.status, BatchStatus::Success);
        assert!(batch.items.is_empty());
        assert!(!batch.category.is_empty());
        assert!(!batch.feed_name.is_empty());
    }

    #[tokio::test]
    async fn test_fetcher_panic_becomes_error_batch() {
        let service = NewsService::new(catalog(), PanickingFetcher, DEFAULT_ITEMS_PER_FEED);

        let batch = service.next_batch().await;

        assert_eq!(batch.status, BatchStatus::Error);
        assert!(batch.items.is_empty());
        assert!(batch.category.is_empty());
        assert!(batch.feed_name.is_empty());
        assert_eq!(batch.error.as_deref(), Some(GENERIC_ERROR));
    }

    #[tokio::test]
    async fn test_empty_catalog_becomes_error_batch() {
        let service = service(Arc::new(StaticSource(3)), Arc::new(Catalog::default()));

        let batch = service.next_batch().await;

        assert_eq!(batch.status, BatchStatus::Error);
        assert!(!batch.error.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_usable_after_panic() {
        let service = NewsService::new(catalog(), PanickingFetcher, DEFAULT_ITEMS_PER_FEED);

        assert!(!service.next_batch().await.is_success());
        assert!(!service.next_batch().await.is_success());

        let degraded = self::service(Arc::new(PanickingSource), catalog());
        assert!(degraded.next_batch().await.is_success());
        assert!(degraded.next_batch().await.is_success());
    }
}
