//! Crawl aggregation
//!
//! One crawl fetches the watched listing page, discovers its pagination, fetches
//! every other page and unions all item links into a single sorted set.

use crate::crawler::fetcher::{fetch_page, FetchError};
use crate::crawler::parser::LinkExtractor;
use futures::future::try_join_all;
use reqwest::Client;
use std::collections::BTreeSet;
use url::Url;

/// Walks a listing and its pagination
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    extractor: LinkExtractor,
}

impl Crawler {
    /// Creates a crawler from an HTTP client and a compiled extractor
    pub fn new(client: Client, extractor: LinkExtractor) -> Self {
        Self { client, extractor }
    }

    /// Crawls `source` and returns every item link found on it and its pages
    ///
    /// # Page set
    ///
    /// The pages scanned are the source page plus every pagination href found
    /// on it. Pagination hrefs are resolved against `source` only to make them
    /// fetchable, and the set is deduplicated on the resolved URL, so a page is
    /// never fetched twice within one crawl. The source page body is reused for
    /// its own items.
    ///
    /// # Errors
    ///
    /// A failure on the source page or on any pagination page fails the whole
    /// crawl. Pagination pages are fetched concurrently and all of them must
    /// succeed before the union is built.
    ///
    /// # Returns
    ///
    /// Item links exactly as written in the pages, deduplicated and in
    /// lexicographic order.
    pub async fn crawl(&self, source: &str) -> Result<BTreeSet<String>, FetchError> {
        let base_url = Url::parse(source).map_err(|e| FetchError::InvalidUrl {
            url: source.to_string(),
            source: e,
        })?;

        let base_page = fetch_page(&self.client, source).await?;
        let base = self.extractor.parse(&base_page.body);

        let pages = secondary_pages(&base_url, &base.pagination);
        tracing::debug!(
            "{}: {} pagination hrefs, {} extra pages to fetch",
            source,
            base.pagination.len(),
            pages.len()
        );

        let fetched = try_join_all(pages.iter().map(|url| fetch_page(&self.client, url))).await?;

        let mut links: BTreeSet<String> = base.items.into_iter().collect();
        for page in &fetched {
            let items = self.extractor.parse(&page.body).items;
            if items.is_empty() {
                tracing::debug!(
                    "No item links on {} (HTTP {})",
                    page.final_url,
                    page.status_code
                );
            }
            links.extend(items);
        }

        tracing::debug!(
            "{}: {} distinct item links over {} pages",
            source,
            links.len(),
            fetched.len() + 1
        );

        Ok(links)
    }
}

/// Resolves pagination hrefs into the set of pages still to fetch
///
/// Fragments are dropped before deduplication since they never reach the
/// server. The source page itself is excluded because its body is already at
/// hand. Hrefs that cannot be resolved to an http(s) URL are skipped.
pub fn secondary_pages(base_url: &Url, pagination: &[String]) -> BTreeSet<String> {
    let mut origin = base_url.clone();
    origin.set_fragment(None);

    let mut pages = BTreeSet::new();

    for href in pagination {
        match base_url.join(href) {
            Ok(mut url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    tracing::warn!(
                        "Skipping unresolvable pagination href {:?}: unsupported scheme {}",
                        href,
                        url.scheme()
                    );
                    continue;
                }

                url.set_fragment(None);
                if url != origin {
                    pages.insert(String::from(url));
                }
            }
            Err(e) => {
                tracing::warn!("Skipping unresolvable pagination href {:?}: {}", href, e);
            }
        }
    }

    pages
}
