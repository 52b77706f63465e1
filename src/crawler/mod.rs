//! Crawler module for fetching listing pages and collecting item links
//!
//! This module contains:
//! - HTTP fetching with a browser header profile
//! - Pagination and item link extraction
//! - Crawl aggregation over all pages of a listing

mod aggregator;
mod fetcher;
mod parser;

pub use aggregator::{secondary_pages, Crawler};
pub use fetcher::{
    browser_headers, build_http_client, fetch_page, FetchError, FetchedPage, BROWSER_USER_AGENT,
};
pub use parser::{LinkExtractor, ParsedListing};

use crate::config::Config;
use crate::NeagentError;
use std::time::Duration;

/// Builds a crawler from the resolved configuration
///
/// # Returns
///
/// * `Ok(Crawler)` - HTTP client and selectors are ready
/// * `Err(NeagentError)` - The client could not be built or a selector is invalid
pub fn crawler_from_config(config: &Config) -> Result<Crawler, NeagentError> {
    let client = build_http_client(Duration::from_secs(config.watch.request_timeout))?;
    let extractor = LinkExtractor::from_config(&config.selectors)?;
    Ok(Crawler::new(client, extractor))
}
