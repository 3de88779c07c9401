use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;

/// How listing entries are driven through the detail cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// One outstanding request at a time, in listing order.
    #[default]
    Sequential,
    /// Every entry at once. Output order is still listing order.
    Parallel,
}

/// Everything a run needs. `Default` carries the fixed project paths.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub listing_path: PathBuf,
    pub details_dir: PathBuf,
    pub json_out: PathBuf,
    pub csv_out: PathBuf,

    /// Pause after every entry, cached or fetched.
    pub delay_ms: u64,
    /// Random extra pause in `0..=delay_jitter_ms`.
    pub delay_jitter_ms: u64,
    pub mode: FetchMode,

    pub item_selector: String,
    pub link_selector: String,
    /// Base for relative hrefs in the listing page.
    pub listing_base_url: Option<String>,

    pub user_agent: String,
    pub timeout: Duration,
    pub log_level: LevelFilter,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            listing_path: PathBuf::from("dataIn/au_companies.html"),
            details_dir: PathBuf::from("dataIn/details"),
            json_out: PathBuf::from("dataOut/au_companies.json"),
            csv_out: PathBuf::from("dataOut/au_companies.csv"),
            delay_ms: 500,
            delay_jitter_ms: 0,
            mode: FetchMode::Sequential,
            item_selector: ".category_list_bus_item".to_string(),
            link_selector: "h2 a".to_string(),
            listing_base_url: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout: Duration::from_secs(30),
            log_level: LevelFilter::Info,
        }
    }
}
