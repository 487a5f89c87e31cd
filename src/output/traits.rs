//! Output handler trait and lead batch summary types

use crate::leads::Lead;
use crate::storage::RunStatus;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Totals for one lead batch
#[derive(Debug, Clone, Default)]
pub struct LeadSummary {
    // Run metadata
    pub run_id: Option<i64>,
    pub query: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,

    // Business counts
    pub total_businesses: u64,
    pub with_emails: u64,
    pub without_website: u64,
    pub refused: u64,
    pub timed_out: u64,

    /// Unique addresses across the whole batch
    pub total_emails: u64,

    pub leads: Vec<Lead>,
}

impl LeadSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of businesses that produced at least one address, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.total_businesses == 0 {
            return 0.0;
        }
        (self.with_emails as f64 / self.total_businesses as f64) * 100.0
    }

    /// Businesses whose site crawl did not complete cleanly
    pub fn total_errors(&self) -> u64 {
        self.without_website + self.refused + self.timed_out
    }
}

/// Receives leads as a batch produces them
pub trait OutputHandler {
    /// Records one finished lead
    fn record_lead(&mut self, lead: &Lead) -> OutputResult<()>;

    /// Finalizes the output with the final status of the batch
    fn finalize(&mut self, status: RunStatus) -> OutputResult<()>;
}
