use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response encoding: {0}")]
    InvalidEncoding(String),

    #[error("Unexpected response: {0}")]
    Status(String),

    #[error("URL not cached and offline mode is set: {0}")]
    NotCached(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No Recipe found in JSON-LD")]
    NoRecipe,
}

/// A single recipe attribute could not be read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field {0} is missing")]
    Missing(&'static str),

    #[error("field {field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Unknown recipe category: {0}")]
    UnknownCategory(String),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("{0}")]
    Other(String),
}

/// Failure of a whole refresh cycle. The previously published data stays visible.
#[derive(Error, Debug, Clone)]
pub enum RefreshError {
    #[error("Timeout after {0:?} fetching data")]
    Timeout(Duration),

    #[error("Refresh aborted: {0}")]
    Aborted(String),
}
