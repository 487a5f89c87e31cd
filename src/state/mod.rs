//! State module for tracking a single crawl attempt
//!
//! # Components
//!
//! - `CrawlTarget`: the immutable description of what to crawl
//! - `Frontier`: URLs scheduled for the current breadth-first level
//! - `VisitedSet`: URL keys already crawled in this attempt
//! - `EmailSet`: lower-cased, deduplicated addresses found so far
//!
//! Frontier, visited set and email set live only as long as one attempt.

mod emails;
mod frontier;
mod target;

pub use emails::EmailSet;
pub use frontier::{Frontier, VisitedSet};
pub use target::CrawlTarget;
