//! Output module for lead batch results
//!
//! This module handles:
//! - Writing finished leads as a JSON array
//! - Generating Markdown reports with per-business rows and totals
//! - Recording leads into the SQLite store as they are produced

mod json;
mod markdown;
mod sqlite_output;
mod traits;

pub use json::write_leads_json;
pub use markdown::{format_markdown_report, generate_markdown_report};
pub use sqlite_output::SqliteOutputHandler;
pub use traits::{LeadSummary, OutputError, OutputHandler, OutputResult};

use crate::leads::{Lead, NO_WEBSITE, TIMEOUT_EXCEEDED, WEBSITE_REFUSED};
use crate::storage::{LeadStore, RunRecord};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Builds a summary for `leads` produced by `query`
pub fn summarize(query: &str, leads: Vec<Lead>) -> LeadSummary {
    let mut summary = LeadSummary {
        query: query.to_string(),
        ..LeadSummary::default()
    };
    tally(&mut summary, leads);
    summary
}

/// Builds the summary of a stored run
///
/// Without `run_id` the most recent run is used.
pub fn load_run_summary(
    storage: &dyn LeadStore,
    run_id: Option<i64>,
) -> Result<LeadSummary, HarvestError> {
    let run = match run_id {
        Some(id) => storage.get_run(id)?,
        None => storage.latest_run()?.ok_or_else(|| {
            HarvestError::InvalidRequest("No lead runs found in database".to_string())
        })?,
    };

    let leads = storage
        .leads_for_run(run.id)?
        .into_iter()
        .map(|stored| stored.lead)
        .collect();

    let mut summary = summary_for_run(&run);
    tally(&mut summary, leads);
    Ok(summary)
}

fn summary_for_run(run: &RunRecord) -> LeadSummary {
    let duration_seconds = match (
        run.started_at.parse::<DateTime<Utc>>(),
        run.finished_at.as_deref().map(str::parse::<DateTime<Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    LeadSummary {
        run_id: Some(run.id),
        query: run.query.clone(),
        started_at: run.started_at.clone(),
        finished_at: run.finished_at.clone(),
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        ..LeadSummary::default()
    }
}

fn tally(summary: &mut LeadSummary, leads: Vec<Lead>) {
    let mut unique = BTreeSet::new();

    for lead in &leads {
        summary.total_businesses += 1;
        if !lead.emails.is_empty() {
            summary.with_emails += 1;
        }
        unique.extend(lead.emails.iter().cloned());

        match lead.scrape_error.as_deref() {
            Some(NO_WEBSITE) => summary.without_website += 1,
            Some(WEBSITE_REFUSED) => summary.refused += 1,
            Some(TIMEOUT_EXCEEDED) => summary.timed_out += 1,
            _ => {}
        }
    }

    summary.total_emails = unique.len() as u64;
    summary.leads = leads;
}
