//! Error types and Result aliases for dirsentry.
//!
//! Every failure of the core is fatal except the policy deletion of a
//! rejected file, which is only logged. Fatal errors travel up with `?`
//! and end the process from `main`.

use thiserror::Error;

/// Result type alias using dirsentry's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dirsentry operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Watch setup or event stream error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Watch lifecycle errors. All of them are unrecoverable.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The notification source or its readiness wrapper could not be created.
    #[error("failed to initialize {what}: {reason}")]
    Init { what: &'static str, reason: String },

    /// The kernel refused a watch registration.
    #[error("failed to watch path '{path}' ({registered} watches already added): {reason}")]
    WatchFailed {
        path: String,
        registered: usize,
        reason: String,
    },

    /// Growing the watch table failed.
    #[error("failed to grow watch table by {additional} slots: {reason}")]
    Growth { additional: usize, reason: String },

    /// The directory tree could not be enumerated.
    #[error("failed to walk '{path}': {reason}")]
    Walk { path: String, reason: String },

    /// Reading the notification stream failed for a reason other than would-block.
    #[error("failed to read notifications: {0}")]
    Read(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl WatcherError {
    /// Create an initialization error.
    pub fn init(what: &'static str, reason: impl ToString) -> Self {
        Self::Init {
            what,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
