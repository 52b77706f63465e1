//! HTML parser for extracting listing links
//!
//! Two independent selector rules run over the same document:
//! - pagination anchors (page-number navigation)
//! - item anchors (listing thumbnails)
//!
//! Both return raw `href` values exactly as written in the page. Nothing is
//! resolved against a base URL here.

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{Html, Selector};

/// Links found on one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedListing {
    /// `href`s of the page-number navigation, in document order
    pub pagination: Vec<String>,

    /// `href`s of the item thumbnails, in document order
    pub items: Vec<String>,
}

/// Compiled pair of selectors for one site layout
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    pagination: Selector,
    items: Selector,
}

impl LinkExtractor {
    /// Compiles both selectors
    ///
    /// # Arguments
    ///
    /// * `pagination` - CSS selector matching page-number anchors
    /// * `items` - CSS selector matching item anchors
    ///
    /// # Returns
    ///
    /// * `Ok(LinkExtractor)` - Both selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - One of them is not valid CSS
    pub fn new(pagination: &str, items: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pagination: compile(pagination)?,
            items: compile(items)?,
        })
    }

    /// Builds an extractor from the `[selectors]` configuration table
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Self::new(&config.pagination, &config.items)
    }

    /// Returns the `href` of every pagination anchor
    pub fn pagination_links(&self, document: &Html) -> Vec<String> {
        hrefs(document, &self.pagination)
    }

    /// Returns the `href` of every item anchor
    pub fn item_links(&self, document: &Html) -> Vec<String> {
        hrefs(document, &self.items)
    }

    /// Parses a page and applies both rules
    ///
    /// # Example
    ///
    /// ```
    /// use neagent_watch::crawler::LinkExtractor;
    ///
    /// let extractor = LinkExtractor::new(".page_numbers a", ".imd_photo a").unwrap();
    /// let html = r#"<div class="imd_photo"><a href="/item/1">1</a></div>"#;
    /// let parsed = extractor.parse(html);
    /// assert_eq!(parsed.items, vec!["/item/1".to_string()]);
    /// assert!(parsed.pagination.is_empty());
    /// ```
    pub fn parse(&self, html: &str) -> ParsedListing {
        let document = Html::parse_document(html);

        ParsedListing {
            pagination: self.pagination_links(&document),
            items: self.item_links(&document),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Collects `href` attributes of matched elements
///
/// Matched elements without an `href` are skipped, and a selector that matches
/// nothing yields an empty list.
fn hrefs(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
