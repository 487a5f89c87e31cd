use crate::config::Config;
use crate::crawler::Orchestrator;
use crate::state::CrawlTarget;
use crate::worker::CrawlResult;
use std::io::{self, Write};
use tracing::error;

/// Child side of the boundary: crawls `target` and returns the terminal result
///
/// Failing to build the crawl stack is reported like a failed crawl.
pub async fn run_worker(config: &Config, target: &CrawlTarget) -> CrawlResult {
    match Orchestrator::from_config(config) {
        Ok(orchestrator) => orchestrator.run(target).await,
        Err(e) => {
            error!(error = %e, "Failed to set up crawler");
            CrawlResult::error(e.to_string())
        }
    }
}

/// Writes the result as one JSON line and flushes
pub fn emit_result(out: &mut impl Write, result: &CrawlResult) -> io::Result<()> {
    let line = serde_json::to_string(result)?;
    writeln!(out, "{}", line)?;
    out.flush()
}
