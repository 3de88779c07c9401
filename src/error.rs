use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("no application/ld+json script on {0}")]
    MissingStructuredData(String),

    #[error("malformed structured data: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("structured data is a JSON {0}, expected an object")]
    UnsupportedShape(&'static str),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSS selector '{0}'")]
    Selector(String),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ScrapeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::Io { path: path.into(), source }
    }
}
