//! Directory tree monitoring.
//!
//! This module provides:
//! - A tombstoning watch table over inotify watch descriptors
//! - The one-shot walk that fills it
//! - Raw notification decoding
//! - Dispatch to stdout, the watch table and the extension policy
//! - The wait/drain loop

pub mod backend;
pub mod decoder;
pub mod event_loop;
pub mod events;
pub mod handler;
pub mod policy;
pub mod registry;
pub mod walker;

pub use backend::{watch_mask, InotifyBackend, WatchBackend, WatchId};
pub use decoder::{decode, Decoder};
pub use event_loop::EventLoop;
pub use events::ChangeEvent;
pub use handler::{DispatchStats, Dispatcher};
pub use policy::ExtensionPolicy;
pub use registry::{SlotIndex, WatchEntry, WatchKind, WatchRegistry};
pub use walker::{walk_tree, WalkSummary};

use std::future::Future;
use std::io::Write;

use inotify::Inotify;

use crate::config::Config;
use crate::error::WatcherError;
use crate::Result;

/// Watch `config.root` and report to `out` until `shutdown` completes.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns the first fatal error: notification source setup, a watch
/// registration, table growth, the tree walk, or a read failure.
pub async fn monitor<W, F>(config: &Config, out: W, shutdown: F) -> Result<DispatchStats>
where
    W: Write,
    F: Future<Output = ()>,
{
    let inotify = Inotify::init().map_err(|e| WatcherError::init("inotify", e))?;

    let mut registry = WatchRegistry::new(
        InotifyBackend::new(inotify.watches()),
        config.initial_capacity,
        config.growth_increment,
    )?;
    walk_tree(&config.root, &mut registry)?;

    let policy = ExtensionPolicy::new(&config.rejected_extensions);
    if !policy.is_empty() {
        tracing::info!(extensions = ?config.rejected_extensions, "Deleting files on arrival");
    }

    let dispatcher = Dispatcher::new(registry, policy, out);
    let mut event_loop = EventLoop::new(&inotify, dispatcher)?;
    event_loop.run(shutdown).await
}
