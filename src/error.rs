//! Error types for fetching, extracting and storing forex rates.
//!
//! Every stage of the ingest run has its own error enum; [`IngestError`]
//! ties them together so the entry point can report a single failure.

use thiserror::Error;

/// Errors raised while downloading the rates document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not finish within the configured timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("can't download the document: HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors raised while turning a document into rate quotes.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document could not be decoded at all.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The document contains no table.
    #[error("no table found in document")]
    NoTable,

    /// A required column header is absent from the rates table.
    #[error("column not found: {0}")]
    MissingColumn(String),

    /// No table matches the configured layout.
    #[error("no table matches the {layout} layout (observed column counts: {observed:?})")]
    LayoutMismatch {
        /// Layout name.
        layout: &'static str,
        /// Column count of every table seen in the document.
        observed: Vec<usize>,
    },

    /// Tables were found but every row was rejected.
    #[error("no data: all {skipped} rows were rejected")]
    NoData {
        /// Number of rejected rows.
        skipped: usize,
    },
}

/// Errors raised by the rate store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored rate is not a valid decimal.
    #[error("invalid stored rate {value:?} for {currency_pair}")]
    InvalidRate {
        /// Pair the value belongs to.
        currency_pair: String,
        /// The raw column text.
        value: String,
    },
}

/// Errors that abort an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document could not be fetched.
    #[error("transport failure: {0}")]
    Transport(#[from] FetchError),

    /// The document held no usable rates.
    #[error("extraction failure: {0}")]
    Extraction(#[from] ExtractError),

    /// Every upsert failed.
    #[error("nothing persisted: {failed} of {extracted} records failed to store")]
    NothingPersisted {
        /// Records handed to the store.
        extracted: usize,
        /// Records the store rejected.
        failed: usize,
    },
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that can't be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid value error.
    pub fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
