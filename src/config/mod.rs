//! Configuration management for dirsentry.
//!
//! Values come from:
//! - Command-line arguments (highest priority)
//! - `DIRSENTRY_*` environment variables
//! - Built-in defaults

mod settings;

pub use settings::{Config, DEFAULT_CAPACITY, DEFAULT_GROWTH_INCREMENT};
