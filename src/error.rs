//! Error types for icon-dl
//!
//! This module provides:
//! - The crate-wide [`Error`] used by start-up code (config, link sources, sweeps)
//! - [`ParseFailure`] for detail-page URLs that do not describe an icon
//! - [`AttemptError`] for the outcome of a single download attempt
//! - [`FetchOutcome`] with its [`RetryReason`] / [`FatalReason`] classification
//!
//! Nothing in here aborts a batch on its own: per-asset errors are recovered
//! inside the downloader and only surface through logging and the run summary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for icon-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for icon-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "icon_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configured regular expression failed to compile
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a configuration key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// A detail-page URL that does not match the icon identifier pattern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse icon URL: {url}")]
pub struct ParseFailure {
    /// The rejected URL
    pub url: String,
}

/// Why one download attempt for an asset did not produce a valid pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The site refused the download because the icon is premium content
    #[error("premium icon refused at {url}")]
    Premium {
        /// Endpoint that answered with the refusal
        url: String,
    },

    /// At least one of the two files is missing or fails validation
    #[error("corrupted pair (vector valid: {vector_valid}, raster valid: {raster_valid})")]
    Corrupted {
        /// Whether the SVG passed validation
        vector_valid: bool,
        /// Whether the PNG passed validation
        raster_valid: bool,
    },
}

/// Result of a single GET against one asset endpoint
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx with a non-empty body
    Success(Vec<u8>),
    /// Failed for this attempt; a later attempt may succeed
    Retryable(RetryReason),
    /// No attempt for this asset can succeed
    Fatal(FatalReason),
}

/// Classification of a retryable fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryReason {
    /// HTTP 429; the caller has already backed off
    #[error("rate limited")]
    RateLimited,
    /// Any other non-success status
    #[error("HTTP {0}")]
    Status(u16),
    /// Success status with nothing in the body
    #[error("empty response body")]
    EmptyBody,
    /// Connection, TLS, timeout or body-read failure
    #[error("transport error: {0}")]
    Transport(String),
    /// The body arrived but could not be written to disk
    #[error("failed to write {path}: {reason}")]
    Write {
        /// Destination file
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },
}

/// Classification of a fetch failure that ends all attempts for an asset
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalReason {
    /// HTTP 403: premium / forbidden content
    #[error("premium content (HTTP {0})")]
    Premium(u16),
}
