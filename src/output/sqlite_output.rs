//! SQLite-backed output handler
//!
//! Saves each lead under one run as soon as it is produced.

use crate::leads::Lead;
use crate::output::traits::{OutputError, OutputHandler, OutputResult};
use crate::storage::{LeadStore, RunStatus};

/// Output handler that writes leads into a [`LeadStore`] run
pub struct SqliteOutputHandler<S: LeadStore> {
    storage: S,
    run_id: i64,
}

impl<S: LeadStore> SqliteOutputHandler<S> {
    /// Opens a new run for `query` in `storage`
    pub fn start(mut storage: S, query: &str) -> OutputResult<Self> {
        let run_id = storage
            .create_run(query)
            .map_err(|e| OutputError::Storage(e.to_string()))?;
        Ok(Self { storage, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: LeadStore> OutputHandler for SqliteOutputHandler<S> {
    fn record_lead(&mut self, lead: &Lead) -> OutputResult<()> {
        self.storage
            .save_lead(self.run_id, lead)
            .map_err(|e| OutputError::Storage(e.to_string()))?;
        Ok(())
    }

    fn finalize(&mut self, status: RunStatus) -> OutputResult<()> {
        let result = match status {
            RunStatus::Completed => self.storage.complete_run(self.run_id),
            RunStatus::Failed => self.storage.fail_run(self.run_id),
            RunStatus::Running => Ok(()),
        };
        result.map_err(|e| OutputError::Storage(e.to_string()))
    }
}
