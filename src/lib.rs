//! dirsentry
//!
//! Recursive inotify monitor for a directory tree. Reports attribute changes,
//! creations, deletions, moves-in and removal of watched directories as a text
//! stream, and deletes newly arrived files whose names end in a rejected
//! extension.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result, WatcherError};
