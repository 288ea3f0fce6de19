//! Parsing and validation of `strata.toml` configuration files.
//!
//! The configuration controls the lowering error policy, assertion handling,
//! debug tracing, the specialized-module naming threshold, and the diagnostic
//! output format. Every field has a default, so an absent file is valid.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config, CONFIG_FILE_NAME};
pub use types::*;
