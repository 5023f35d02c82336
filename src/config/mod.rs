//! Configuration module for Octo-Trawl
//!
//! Handles loading, parsing, and validating TOML configuration files. Every
//! field has a sensible default, so running without a config file is fine;
//! command-line flags take precedence over file values.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, CrawlerConfig, GovernorConfig, OutputConfig};
pub use validation::validate;
