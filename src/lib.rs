//! Random News - randomized previews of syndicated news
//!
//! This crate picks a random feed from a categorized catalog, samples a few
//! of its entries and serves them as cleaned, bounded previews over HTTP.

pub mod cache;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod news;
pub mod routes;
pub mod sanitize;
pub mod selector;
