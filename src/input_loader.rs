use std::fs;
use std::path::Path;

use log::{info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::config::ScrapeConfig;
use crate::error::{Result, ScrapeError};

/// One company on the saved listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Reads the saved listing page at `path`. A missing file aborts the run.
pub fn load_listing<P: AsRef<Path>>(path: P, config: &ScrapeConfig) -> Result<Vec<ListingEntry>> {
    let path = path.as_ref();
    let html = fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
    let entries = parse_listing(&html, config)?;
    info!("Loaded {} listing entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Every element matching the item selector becomes an entry, in document
/// order. Nothing is skipped or deduplicated.
pub fn parse_listing(html: &str, config: &ScrapeConfig) -> Result<Vec<ListingEntry>> {
    let item_selector = parse_selector(&config.item_selector)?;
    let link_selector = parse_selector(&config.link_selector)?;
    let base = match config.listing_base_url.as_deref() {
        Some(raw) => match Url::parse(raw) {
            Ok(u) => Some(u),
            Err(e) => {
                warn!("Ignoring invalid listing base URL '{}': {}", raw, e);
                None
            }
        },
        None => None,
    };

    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for (i, item) in document.select(&item_selector).enumerate() {
        let id = match item.value().attr("id") {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                let fallback = format!("listing-{}", i + 1);
                warn!("Listing item {} has no id attribute, using '{}'", i + 1, fallback);
                fallback
            }
        };

        let (name, url) = match item.select(&link_selector).next() {
            Some(link) => {
                let name = link.text().collect::<String>().trim().to_string();
                let href = link.value().attr("href").unwrap_or_default().trim();
                (name, resolve_href(href, base.as_ref()))
            }
            None => {
                warn!("Listing item '{}' has no '{}' link", id, config.link_selector);
                (String::new(), String::new())
            }
        };

        entries.push(ListingEntry { id, name, url });
    }

    Ok(entries)
}

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|_| ScrapeError::Selector(raw.to_string()))
}

fn resolve_href(href: &str, base: Option<&Url>) -> String {
    if href.is_empty() {
        return String::new();
    }
    if let Ok(absolute) = Url::parse(href) {
        return absolute.to_string();
    }
    match base.map(|b| b.join(href)) {
        Some(Ok(joined)) => joined.to_string(),
        _ => {
            warn!("Could not make '{}' absolute; keeping it as-is", href);
            href.to_string()
        }
    }
}
