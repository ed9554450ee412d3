use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Number of items sampled from each feed
    #[serde(default = "default_items_per_feed")]
    pub items_per_feed: usize,
    /// Cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum number of cached feed results
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Upstream request timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Largest feed body accepted, in bytes
    #[serde(default = "default_max_feed_bytes")]
    pub max_feed_bytes: usize,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

fn default_items_per_feed() -> usize {
    3
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    100
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_max_feed_bytes() -> usize {
    crate::fetcher::DEFAULT_MAX_FEED_BYTES
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    pub name: String,
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.items_per_feed == 0 {
            anyhow::bail!("items_per_feed must be at least 1");
        }
        if self.cache_capacity == 0 {
            anyhow::bail!("cache_capacity must be at least 1");
        }
        if self.max_feed_bytes == 0 {
            anyhow::bail!("max_feed_bytes must be at least 1");
        }

        let mut names = HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                anyhow::bail!("duplicate category '{}'", category.name);
            }
            if category.feeds.is_empty() {
                anyhow::bail!("category '{}' has no feeds", category.name);
            }
        }
        Ok(())
    }
}
