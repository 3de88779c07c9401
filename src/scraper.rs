use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;

use crate::config::ScrapeConfig;
use crate::error::{Result, ScrapeError};
use crate::extractor::Extractor;

/// Where detail pages come from. [`Scraper`] goes over HTTP; tests plug in
/// canned pages.
pub trait PageSource: Sync {
    fn fetch_page(&self, url: &str) -> Result<String>;
}

pub struct Scraper {
    client: Client,
}

impl Scraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-AU,en;q=0.9"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(Scraper { client })
    }

    fn visit_page(&self, url: &str) -> std::result::Result<(String, StatusCode), reqwest::Error> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let text = resp.text()?;
        Ok((text, status))
    }
}

impl PageSource for Scraper {
    fn fetch_page(&self, url: &str) -> Result<String> {
        let (html, status) = self.visit_page(url).map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })?;

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Blocked at {}: {}", url, status);
        }
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(html)
    }
}

/// Fetches `url` and returns the raw text of its first JSON-LD script.
pub fn try_fetch_structured_data(
    source: &dyn PageSource,
    extractor: &Extractor,
    url: &str,
) -> Result<String> {
    let html = source.fetch_page(url)?;
    extractor
        .extract_structured_data(&html)
        .ok_or_else(|| ScrapeError::MissingStructuredData(url.to_string()))
}

/// Like [`try_fetch_structured_data`], but every failure is logged and
/// reported as no data.
pub fn fetch_structured_data(
    source: &dyn PageSource,
    extractor: &Extractor,
    url: &str,
) -> Option<String> {
    match try_fetch_structured_data(source, extractor, url) {
        Ok(raw) => Some(raw),
        Err(ScrapeError::MissingStructuredData(_)) => {
            info!("\t> No structured data on {}", url);
            None
        }
        Err(e) => {
            warn!("Error fetching or parsing structured data: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    struct CannedPages(HashMap<&'static str, &'static str>);

    impl PageSource for CannedPages {
        fn fetch_page(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .map(|html| html.to_string())
                .ok_or_else(|| ScrapeError::Status { url: url.to_string(), status: 404 })
        }
    }

    fn pages() -> CannedPages {
        let mut map = HashMap::new();
        map.insert(
            "https://dir.example/acme",
            r#"<script type="application/ld+json">{"name":"Acme"}</script>"#,
        );
        map.insert("https://dir.example/bare", "<html><body>nothing here</body></html>");
        CannedPages(map)
    }

    #[test]
    fn returns_raw_script_text() {
        let raw = fetch_structured_data(&pages(), &Extractor::new(), "https://dir.example/acme");
        assert_eq!(raw.as_deref(), Some(r#"{"name":"Acme"}"#));
    }

    #[test]
    fn missing_tag_is_reported_and_absorbed() {
        let extractor = Extractor::new();
        let err = try_fetch_structured_data(&pages(), &extractor, "https://dir.example/bare");
        assert!(matches!(err, Err(ScrapeError::MissingStructuredData(_))));
        assert!(fetch_structured_data(&pages(), &extractor, "https://dir.example/bare").is_none());
    }

    #[test]
    fn failed_request_is_absorbed() {
        assert!(fetch_structured_data(&pages(), &Extractor::new(), "https://dir.example/gone").is_none());
    }

    #[test]
    fn unreachable_host_yields_no_data() {
        let config = ScrapeConfig {
            timeout: Duration::from_secs(2),
            ..ScrapeConfig::default()
        };
        let scraper = Scraper::new(&config).unwrap();
        let err = scraper.fetch_page("http://127.0.0.1:1/company");
        assert!(matches!(err, Err(ScrapeError::Http { .. })));
        assert!(fetch_structured_data(&scraper, &Extractor::new(), "http://127.0.0.1:1/company").is_none());
    }
}
