//! Configuration module for linkmap
//!
//! This module handles defaults, TOML configuration files, environment
//! variable overrides, and validation of the merged result.
//!
//! # Example
//!
//! ```no_run
//! use linkmap::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkmap.toml")).unwrap();
//! println!("Crawling with {} workers", config.crawl.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlOptions, HttpSettings};

// Re-export parser functions
pub use parser::{apply_env_overrides, load_config};

// Re-export validation functions
pub use validation::{validate, validate_crawl_options, validate_http_settings};
