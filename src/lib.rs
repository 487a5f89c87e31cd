//! Lead Harvester: contact-email harvesting for lead generation
//!
//! This crate looks up businesses through a places directory, crawls each
//! business website for contact email addresses, narrows the addresses down
//! with a relevance filter and records the results for later outreach.
//!
//! The crawler is the core: a bounded, priority-ordered breadth-first crawl
//! that uses plain HTTP for server-rendered sites and a headless browser for
//! script-rendered ones, with each site isolated in its own worker process.

pub mod config;
pub mod crawler;
pub mod detect;
pub mod extract;
pub mod leads;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;
pub mod worker;

use thiserror::Error;

/// Main error type for Lead Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Snapshot write failed for {path}: {source}")]
    Snapshot {
        path: String,
        source: std::io::Error,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Places API error: {0}")]
    Places(String),

    #[error("Relevance filter error: {0}")]
    Filter(String),

    #[error("Invalid crawl request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Lead Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{EmailCrawler, Orchestrator};
pub use detect::SiteKind;
pub use state::{CrawlTarget, EmailSet};
pub use worker::{CrawlResult, WorkerOutcome};
