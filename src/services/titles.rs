// src/services/titles.rs

//! Title enumeration from a listing page.
//!
//! The listing page is the seed of a crawl: if it cannot be fetched the run
//! has nothing to do, so that is the one fatal failure of the pipeline.

use std::collections::BTreeSet;

use scraper::{ElementRef, Html};

use crate::error::{AppError, Result};
use crate::models::{ListingScope, PageSourceConfig};
use crate::utils::http::{FetchOutcome, PageSource};
use crate::utils::{element_text, parse_selector};

/// Path prefix of content pages.
const CONTENT_PREFIX: &str = "/wiki/";

/// Pages that are never entities, compared lowercased.
const NON_CONTENT_PAGES: [&str; 1] = ["main_page"];

/// Discovers the entity titles to crawl from one listing page.
pub struct TitleEnumerator<'a> {
    source: &'a dyn PageSource,
    config: &'a PageSourceConfig,
}

impl<'a> TitleEnumerator<'a> {
    pub fn new(source: &'a dyn PageSource, config: &'a PageSourceConfig) -> Self {
        Self { source, config }
    }

    /// Fetch the listing page and return sorted, deduplicated titles.
    pub async fn enumerate(&self) -> Result<Vec<String>> {
        let url = self.config.listing_url();
        log::info!("Fetching listing page {}", url);

        match self.source.fetch(&url).await {
            FetchOutcome::Success(html) => {
                let titles = extract_titles(&html, &self.config.listing, &self.config.scope)?;
                log::info!("Found {} titles on {}", titles.len(), url);
                Ok(titles)
            }
            failure => {
                log::error!("Listing page {} failed: {}", url, failure.describe());
                Err(AppError::listing(url, failure.describe()))
            }
        }
    }
}

/// Extract entity titles from listing markup.
///
/// `listing_path` is the listing page's own path; links back to it are
/// skipped along with other non-content pages.
pub fn extract_titles(html: &str, listing_path: &str, scope: &ListingScope) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let listing_name = listing_path
        .strip_prefix(CONTENT_PREFIX)
        .unwrap_or(listing_path)
        .to_lowercase();

    let hrefs = match scope {
        ListingScope::All => all_links(&document)?,
        ListingScope::Tables { required, any_of } => table_links(&document, required, any_of)?,
    };

    let titles: BTreeSet<String> = hrefs
        .iter()
        .filter_map(|href| title_from_href(href, &listing_name))
        .collect();

    Ok(titles.into_iter().collect())
}

/// Turn a content link into a human-readable title, or reject it.
fn title_from_href(href: &str, listing_name: &str) -> Option<String> {
    let raw = href.strip_prefix(CONTENT_PREFIX)?;
    let raw = raw.split(['#', '?']).next().unwrap_or_default();

    if raw.is_empty() || raw.contains(':') || raw.contains('%') {
        return None;
    }

    let lower = raw.to_lowercase();
    if NON_CONTENT_PAGES.contains(&lower.as_str()) || lower == listing_name {
        return None;
    }

    let title = raw.replace('_', " ").trim().to_string();
    (!title.is_empty()).then_some(title)
}

fn all_links(document: &Html) -> Result<Vec<String>> {
    let link_sel = parse_selector("a[href]")?;
    Ok(document
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect())
}

/// Row links of tables whose header row names the expected columns.
fn table_links(document: &Html, required: &str, any_of: &[String]) -> Result<Vec<String>> {
    let table_sel = parse_selector("table")?;
    let th_sel = parse_selector("th")?;
    let tr_sel = parse_selector("tr")?;
    let link_sel = parse_selector("a[href]")?;

    let required = required.to_lowercase();
    let any_of: Vec<String> = any_of.iter().map(|c| c.to_lowercase()).collect();

    let mut hrefs = Vec::new();
    for table in document.select(&table_sel) {
        let headers: Vec<String> = table
            .select(&th_sel)
            .map(|th| element_text(&th).to_lowercase())
            .collect();
        if !is_entity_table(&headers, &required, &any_of) {
            continue;
        }

        for row in table.select(&tr_sel).skip(1) {
            if let Some(href) = first_href(&row, &link_sel) {
                hrefs.push(href);
            }
        }
    }
    Ok(hrefs)
}

fn is_entity_table(headers: &[String], required: &str, any_of: &[String]) -> bool {
    headers.iter().any(|h| h == required) && headers.iter().any(|h| any_of.contains(h))
}

fn first_href(row: &ElementRef<'_>, link_sel: &scraper::Selector) -> Option<String> {
    row.select(link_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}
