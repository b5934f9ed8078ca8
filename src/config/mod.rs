//! Configuration module for Site-Folio
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags override file values.
//!
//! # Example
//!
//! ```no_run
//! use site_folio::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-folio.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{BrowserConfig, Config, CrawlerConfig, OutputConfig, DEFAULT_DATABASE_NAME};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_WORKERS};
