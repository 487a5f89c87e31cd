//! Configuration module for Lead Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a missing file section (or no file at all)
//! yields a usable configuration.
//!
//! # Example
//!
//! ```no_run
//! use lead_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    BrowserConfig, Config, CrawlerConfig, FilterConfig, OutputConfig, PlacesConfig,
    UserAgentConfig,
};

pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, read_api_key,
};
