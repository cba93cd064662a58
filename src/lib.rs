//! Galinfo: a metadata search service for visual-novel and doujin game catalogs
//!
//! This crate fetches listing pages from third-party catalog sites, extracts a
//! normalized metadata record per title (name, brand, release date, tags,
//! images, description), and serves the result through a small JSON API.
//! Fetching is polite: randomized user agents, jittered inter-request delays,
//! exponential-backoff retries, and optional robots.txt gating.

pub mod config;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod robots;
pub mod server;
pub mod sites;

use thiserror::Error;

/// Main error type for galinfo operations
#[derive(Debug, Error)]
pub enum GalinfoError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("unsupported site: {0}")]
    UnsupportedSite(String),
}

/// Fetch-layer errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or HTTP failure that survived the retry budget.
    #[error("transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    /// Fetch blocked by the site's robots policy. Never retried.
    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    /// HTTP method outside the supported set. Fails before any network call.
    #[error("unsupported HTTP method: {0}")]
    InvalidMethod(String),
}

/// Extraction errors
///
/// Missing individual fields are not errors; extraction is best-effort and
/// leaves absent fields at their defaults. Only a failure of the parse pass
/// itself surfaces here.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("failed to parse page at {url}: {message}")]
    Page { url: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address {addr:?}: {source}")]
    InvalidBindAddr {
        addr: String,
        source: std::net::AddrParseError,
    },
}

/// Result type alias for galinfo operations
pub type Result<T> = std::result::Result<T, GalinfoError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{FetchConfig, Fetcher};
pub use model::{NormalizedRecord, SearchCandidate};
pub use sites::{Site, SiteExtractor};
