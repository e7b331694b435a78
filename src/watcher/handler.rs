//! Per-event dispatch: report, retire, enforce.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::backend::WatchBackend;
use super::events::ChangeEvent;
use super::policy::ExtensionPolicy;
use super::registry::{SlotIndex, WatchRegistry};
use crate::Result;

/// Running totals since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Records decoded and dispatched.
    pub events: u64,
    /// Lines written to the output.
    pub printed: u64,
    /// Records whose watch could not be resolved.
    pub unresolved: u64,
    /// Watches retired after their directory was removed.
    pub retired: u64,
    /// Policy deletions attempted.
    pub deletions: u64,
    /// Policy deletions that failed.
    pub delete_failures: u64,
}

/// Routes decoded events to the output, the registry and the policy.
#[derive(Debug)]
pub struct Dispatcher<B: WatchBackend, W: Write> {
    registry: WatchRegistry<B>,
    policy: ExtensionPolicy,
    out: W,
    stats: DispatchStats,
}

impl<B: WatchBackend, W: Write> Dispatcher<B, W> {
    /// Create a dispatcher over a populated registry.
    pub fn new(registry: WatchRegistry<B>, policy: ExtensionPolicy, out: W) -> Self {
        Self {
            registry,
            policy,
            out,
            stats: DispatchStats::default(),
        }
    }

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output cannot be written. A failed policy
    /// deletion is logged and counted.
    pub fn dispatch(&mut self, event: &ChangeEvent) -> Result<()> {
        self.stats.events += 1;

        let (dir, slot): (Option<PathBuf>, Option<SlotIndex>) =
            match self.registry.resolve(event.watch) {
                Some((path, slot)) => (Some(path.to_path_buf()), Some(slot)),
                None => {
                    self.stats.unresolved += 1;
                    (None, None)
                }
            };

        match event.render(dir.as_deref()) {
            Some(line) => {
                writeln!(self.out, "{line}")?;
                self.stats.printed += 1;
            }
            None if event.watch.0 == -1 => {
                tracing::warn!("Kernel event queue overflowed, notifications were lost");
            }
            None => {
                tracing::trace!(watch = %event.watch, mask = ?event.mask, "Unlabelled record");
            }
        }

        if event.is_self_deletion() {
            if let Some(slot) = slot {
                if self.registry.retire(slot) {
                    self.stats.retired += 1;
                }
            }
        }

        if event.introduces_file() {
            if let Some(name) = &event.name {
                if self.policy.should_reject(name) {
                    self.enforce(dir.as_deref(), name);
                }
            }
        }

        Ok(())
    }

    fn enforce(&mut self, dir: Option<&Path>, name: &OsStr) {
        let Some(dir) = dir else {
            tracing::warn!(
                name = %name.to_string_lossy(),
                "Rejected file in unknown directory, not deleting"
            );
            return;
        };

        let target = dir.join(name);
        self.stats.deletions += 1;
        match std::fs::remove_file(&target) {
            Ok(()) => tracing::info!(path = %target.display(), "Deleted rejected file"),
            Err(e) => {
                self.stats.delete_failures += 1;
                tracing::warn!(path = %target.display(), error = %e, "Failed to delete rejected file");
            }
        }
    }

    /// Flush buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be flushed.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Tombstone every remaining watch. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.registry.teardown();
    }

    /// Current totals.
    #[must_use]
    pub const fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// The watch table.
    #[must_use]
    pub const fn registry(&self) -> &WatchRegistry<B> {
        &self.registry
    }

    /// The output sink.
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }
}
