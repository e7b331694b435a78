//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;

/// Default number of pre-allocated watch table slots.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default number of slots added each time the watch table fills up.
pub const DEFAULT_GROWTH_INCREMENT: usize = 32;

/// Main configuration for a monitoring run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the directory tree to watch.
    pub root: PathBuf,

    /// Watch table slots allocated up front.
    pub initial_capacity: usize,

    /// Slots added whenever the watch table is full.
    pub growth_increment: usize,

    /// Suffixes whose files are deleted as soon as they appear.
    pub rejected_extensions: Vec<String>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            initial_capacity: DEFAULT_CAPACITY,
            growth_increment: DEFAULT_GROWTH_INCREMENT,
            rejected_extensions: Vec::new(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::config(format!(
                "root '{}' is not a directory",
                self.root.display()
            )));
        }

        if self.initial_capacity == 0 {
            return Err(Error::config("initial capacity cannot be 0"));
        }

        if self.growth_increment == 0 {
            return Err(Error::config("growth increment cannot be 0"));
        }

        // An empty suffix would match every file name.
        if self.rejected_extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::config("rejected extensions cannot contain empty entries"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}
