use std::collections::HashSet;
use std::thread::{self, ScopedJoinHandle};

use log::{info, warn};

use crate::config::{FetchMode, ScrapeConfig};
use crate::detail_cache::{DetailCache, DetailOutcome, DetailStatus};
use crate::error::Result;
use crate::exporter::{self, merge_record, CompanyRecord};
use crate::input_loader::{load_listing, ListingEntry};
use crate::scraper::PageSource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub companies: usize,
    pub cached: usize,
    pub fetched: usize,
    pub missing: usize,
}

impl RunReport {
    fn tally(&mut self, status: DetailStatus) {
        self.companies += 1;
        match status {
            DetailStatus::Cached => self.cached += 1,
            DetailStatus::Fetched => self.fetched += 1,
            DetailStatus::NoData => self.missing += 1,
        }
    }
}

/// Parses the listing and resolves every entry's details, one record per
/// entry in listing order.
pub fn collect_records<S: PageSource>(
    config: &ScrapeConfig,
    source: &S,
) -> Result<(Vec<CompanyRecord>, RunReport)> {
    let entries = load_listing(&config.listing_path, config)?;
    for id in repeated_ids(&entries) {
        warn!(
            "Id '{}' appears more than once; later entries reuse the first one's cached details",
            id
        );
    }
    let cache = DetailCache::new(config.details_dir.clone()).with_delay(config.delay_ms, config.delay_jitter_ms);

    let outcomes = match config.mode {
        FetchMode::Sequential => run_sequential(&cache, source, &entries),
        FetchMode::Parallel => run_parallel(&cache, source, &entries),
    };

    let mut report = RunReport::default();
    let records: Vec<CompanyRecord> = entries
        .iter()
        .zip(&outcomes)
        .map(|(entry, outcome)| {
            report.tally(outcome.status);
            merge_record(entry, outcome.record.as_ref())
        })
        .collect();

    Ok((records, report))
}

/// Full run: collect, then overwrite the JSON and CSV exports.
pub fn run<S: PageSource>(config: &ScrapeConfig, source: &S) -> Result<RunReport> {
    let (records, report) = collect_records(config, source)?;
    info!(
        "DONE: Extracted {} companies ({} cached, {} fetched, {} without data).",
        report.companies, report.cached, report.fetched, report.missing
    );

    exporter::write_json(&config.json_out, &records)?;
    exporter::write_csv(&config.csv_out, &records)?;
    Ok(report)
}

fn run_sequential<S: PageSource>(
    cache: &DetailCache,
    source: &S,
    entries: &[ListingEntry],
) -> Vec<DetailOutcome> {
    let total = entries.len();
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            info!("Processing {} / {} | ID: {} | URL: {}", i + 1, total, entry.id, entry.url);
            cache.process_company(source, &entry.id, &entry.url)
        })
        .collect()
}

fn run_parallel<S: PageSource>(
    cache: &DetailCache,
    source: &S,
    entries: &[ListingEntry],
) -> Vec<DetailOutcome> {
    let total = entries.len();
    let process = |i: usize, entry: &ListingEntry| {
        info!("Processing {} / {} | ID: {} | URL: {}", i + 1, total, entry.id, entry.url);
        cache.process_company(source, &entry.id, &entry.url)
    };

    thread::scope(|scope| {
        let workers: Vec<Worker<'_>> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let spawned = thread::Builder::new()
                    .name(format!("company-{}", i + 1))
                    .spawn_scoped(scope, move || process(i, entry));
                match spawned {
                    Ok(handle) => Worker::Running(handle),
                    Err(e) => {
                        warn!("Could not start a worker for '{}' ({}), processing it inline", entry.id, e);
                        Worker::Done(process(i, entry))
                    }
                }
            })
            .collect();

        // Joined in spawn order so results line up with `entries`.
        workers
            .into_iter()
            .zip(entries)
            .map(|(worker, entry)| match worker {
                Worker::Done(outcome) => outcome,
                Worker::Running(handle) => handle.join().unwrap_or_else(|_| {
                    warn!("Worker for '{}' panicked, treating as no data", entry.id);
                    DetailOutcome { record: None, status: DetailStatus::NoData }
                }),
            })
            .collect()
    })
}

enum Worker<'scope> {
    Running(ScopedJoinHandle<'scope, DetailOutcome>),
    Done(DetailOutcome),
}

/// Ids that occur more than once, each reported once in listing order.
fn repeated_ids(entries: &[ListingEntry]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    entries
        .iter()
        .map(|entry| entry.id.as_str())
        .filter(|id| !seen.insert(*id) && reported.insert(*id))
        .collect()
}
