//! Worker process boundary
//!
//! Each site is crawled in its own OS process so a hung or crashed browser
//! cannot take the batch down with it.
//!
//! # Protocol
//!
//! The parent runs `lead-harvester [--config FILE] worker URL DEPTH RETRIES SNAPSHOT`.
//! The child:
//! - overwrites `SNAPSHOT` with the addresses found so far after every page
//! - prints exactly one JSON line on stdout when it finishes:
//!   `{"status":"ok","emails":[...]}` or `{"status":"error","error":"..."}`
//! - exits non-zero in the error case
//!
//! Logs go to stderr. The parent enforces a wall-clock limit; on expiry it
//! kills the child and falls back to the snapshot.

mod protocol;
mod runner;
mod supervisor;

pub use protocol::CrawlResult;
pub use runner::{emit_result, run_worker};
pub use supervisor::{WorkerOutcome, WorkerSupervisor};
