use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::delay_manager::Delay;
use crate::error::{Result, ScrapeError};
use crate::extractor::{DetailRecord, Extractor};
use crate::scraper::{fetch_structured_data, PageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStatus {
    /// Read back from an existing cache file.
    Cached,
    /// Fetched from the detail page and written to the cache.
    Fetched,
    NoData,
}

#[derive(Debug, Clone)]
pub struct DetailOutcome {
    pub record: Option<DetailRecord>,
    pub status: DetailStatus,
}

impl DetailOutcome {
    fn no_data() -> Self {
        DetailOutcome { record: None, status: DetailStatus::NoData }
    }
}

/// One JSON file per company id. Files are never expired or rewritten.
pub struct DetailCache {
    dir: PathBuf,
    extractor: Extractor,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl DetailCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        DetailCache {
            dir: dir.into(),
            extractor: Extractor::new(),
            delay_ms: 0,
            delay_jitter_ms: 0,
        }
    }

    /// Pause applied after every company, cached or not.
    pub fn with_delay(mut self, delay_ms: u64, jitter_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self.delay_jitter_ms = jitter_ms;
        self
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.path_for(id).exists()
    }

    /// Reads a cached record. `Ok(None)` when there is no file.
    pub fn load(&self, id: &str) -> Result<Option<DetailRecord>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| ScrapeError::io(&path, e))?;
        self.extractor.parse_detail(&content).map(Some)
    }

    /// Writes `record` as a single pretty-printed JSON document.
    pub fn store(&self, id: &str, record: &DetailRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| ScrapeError::io(&self.dir, e))?;
        let path = self.path_for(id);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(|e| ScrapeError::io(&path, e))?;
        Ok(path)
    }

    /// Cached record for `id` if there is one, otherwise fetch `url`, cache
    /// the result and return it. Failures come back as no data.
    pub fn process_company(&self, source: &dyn PageSource, id: &str, url: &str) -> DetailOutcome {
        if let Some(stem) = renamed_stem(id) {
            warn!("Id '{}' is cached as '{}.json'; other ids with the same stem share that file", id, stem);
        }
        let outcome = self.lookup_or_fetch(source, id, url);
        Delay::with_jitter(self.delay_ms, self.delay_jitter_ms).wait();
        outcome
    }

    fn lookup_or_fetch(&self, source: &dyn PageSource, id: &str, url: &str) -> DetailOutcome {
        if self.contains(id) {
            info!("\t> File exists, reading from path...");
            return match self.load(id) {
                Ok(Some(record)) => DetailOutcome { record: Some(record), status: DetailStatus::Cached },
                Ok(None) => DetailOutcome::no_data(),
                Err(e) => {
                    warn!("Unreadable cache file {:?}, treating as no data: {}", self.path_for(id), e);
                    DetailOutcome::no_data()
                }
            };
        }

        info!("\t> Fetching new data from URL...");
        let Some(raw) = fetch_structured_data(source, &self.extractor, url) else {
            info!("\t> No data received for URL: {}", url);
            return DetailOutcome::no_data();
        };

        let record = match self.extractor.parse_detail(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Discarding structured data from {}: {}", url, e);
                return DetailOutcome::no_data();
            }
        };

        match self.store(id, &record) {
            Ok(path) => info!("\t> Data saved to file: {:?}", path),
            Err(e) => warn!("Could not cache details for '{}': {}", id, e),
        }
        DetailOutcome { record: Some(record), status: DetailStatus::Fetched }
    }
}

/// The sanitised stem, when it differs from `id`.
fn renamed_stem(id: &str) -> Option<String> {
    let stem = file_stem(id);
    (stem != id).then_some(stem)
}

/// Ids come from page markup; keep them inside the cache directory.
fn file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    match stem.trim_matches('.') {
        "" => "_".to_string(),
        _ => stem,
    }
}
