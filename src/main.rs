use std::error::Error;

use company_scraper_lib::{aggregator, logger, ScrapeConfig, Scraper};
use log::{error, info};

fn main() -> Result<(), Box<dyn Error>> {
    let config = ScrapeConfig::default();
    logger::init(config.log_level);
    info!("Starting company scraper ({:?} mode)...", config.mode);

    let scraper = Scraper::new(&config)?;
    match aggregator::run(&config, &scraper) {
        Ok(report) => {
            info!(
                "Exported {} companies to {:?} and {:?}",
                report.companies, config.json_out, config.csv_out
            );
            Ok(())
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            Err(e.into())
        }
    }
}
