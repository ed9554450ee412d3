use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::CategoryConfig;
use crate::error::SelectError;

/// Draws allowed before giving up on finding a pick different from the last.
pub const MAX_ATTEMPTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub sources: Vec<Source>,
}

/// Every configured category and its feeds, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn from_config(categories: &[CategoryConfig]) -> Self {
        let categories = categories
            .iter()
            .map(|category| Category {
                name: category.name.clone(),
                sources: category
                    .feeds
                    .iter()
                    .map(|feed| Source {
                        name: feed.name.clone(),
                        url: feed.url.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self::new(categories)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn source_count(&self) -> usize {
        self.categories.iter().map(|c| c.sources.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub category: String,
    pub source: Source,
}

impl Pick {
    fn matches(&self, last: &(String, String)) -> bool {
        self.category == last.0 && self.source.name == last.1
    }
}

/// Random feed picker that avoids handing out the same (category, feed)
/// pair twice in a row.
#[derive(Debug, Default)]
pub struct Selector {
    last_pick: Mutex<Option<(String, String)>>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pick(&self, catalog: &Catalog) -> Result<Pick, SelectError> {
        self.pick_with(catalog, &mut rand::thread_rng())
    }

    /// Uniformly draw a category, then a feed within it, retrying while the
    /// draw repeats the previous pick. After [`MAX_ATTEMPTS`] the last draw
    /// is returned as-is, so single-feed catalogs still terminate.
    pub fn pick_with<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Result<Pick, SelectError> {
        let mut last_pick = self.last_pick.lock().map_err(|_| SelectError::Poisoned)?;

        let mut attempts = 0;
        let pick = loop {
            attempts += 1;
            let pick = draw(catalog, rng)?;
            let repeated = last_pick.as_ref().is_some_and(|last| pick.matches(last));
            if !repeated {
                break pick;
            }
            if attempts >= MAX_ATTEMPTS {
                debug!(
                    "No different feed after {} attempts, repeating '{}'",
                    attempts, pick.source.name
                );
                break pick;
            }
        };

        *last_pick = Some((pick.category.clone(), pick.source.name.clone()));
        Ok(pick)
    }

    pub fn last_pick(&self) -> Option<(String, String)> {
        self.last_pick.lock().ok().and_then(|last| last.clone())
    }
}

fn draw<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Result<Pick, SelectError> {
    let category = catalog
        .categories
        .choose(rng)
        .ok_or(SelectError::EmptyCatalog)?;
    let source = category
        .sources
        .choose(rng)
        .ok_or_else(|| SelectError::EmptyCategory(category.name.clone()))?;

    Ok(Pick {
        category: category.name.clone(),
        source: source.clone(),
    })
}
