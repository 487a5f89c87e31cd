use serde::{Deserialize, Serialize};

/// Terminal value of one worker invocation, sent as a single JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CrawlResult {
    Ok { emails: Vec<String> },
    Error { error: String },
}

impl CrawlResult {
    pub fn ok(emails: Vec<String>) -> Self {
        CrawlResult::Ok { emails }
    }

    pub fn error(error: impl Into<String>) -> Self {
        CrawlResult::Error {
            error: error.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CrawlResult::Ok { .. })
    }

    /// Finds the result in a worker's stdout
    ///
    /// Only the last non-empty line counts; anything that does not parse is
    /// a malformed result.
    pub fn from_stdout(stdout: &str) -> Option<Self> {
        let line = stdout.lines().rev().find(|line| !line.trim().is_empty())?;
        serde_json::from_str(line.trim()).ok()
    }
}
