pub mod aggregator;
pub mod config;
pub mod delay_manager;
pub mod detail_cache;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod input_loader;
pub mod logger;
pub mod scraper;

// Exporting types for convenience
pub use aggregator::{collect_records, run, RunReport};
pub use config::{FetchMode, ScrapeConfig};
pub use detail_cache::{DetailCache, DetailOutcome, DetailStatus};
pub use error::{Result, ScrapeError};
pub use exporter::CompanyRecord;
pub use extractor::{DetailRecord, Extractor};
pub use input_loader::ListingEntry;
pub use crate::scraper::{PageSource, Scraper};
