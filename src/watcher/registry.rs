//! Watch table.
//!
//! Append-only: entries are tombstoned in place when retired, never removed,
//! so a [`SlotIndex`] stays valid for the life of the registry. Capacity grows
//! by a fixed increment each time a registration finds the table full.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::backend::{WatchBackend, WatchId};
use crate::error::WatcherError;
use crate::Result;

/// Stable position of an entry in the watch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub usize);

/// Kind of object being watched. Only directories are ever registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    /// A directory.
    Directory,
}

/// One row of the watch table.
#[derive(Debug)]
pub struct WatchEntry<H> {
    id: WatchId,
    handle: Option<H>,
    path: PathBuf,
    kind: WatchKind,
    active: bool,
}

impl<H> WatchEntry<H> {
    /// Kernel descriptor this entry was registered under.
    #[must_use]
    pub const fn id(&self) -> WatchId {
        self.id
    }

    /// Watched path; empty once the entry is retired.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of object being watched.
    #[must_use]
    pub const fn kind(&self) -> WatchKind {
        self.kind
    }

    /// Whether the entry is live.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

/// Table of directory watches backed by a [`WatchBackend`].
#[derive(Debug)]
pub struct WatchRegistry<B: WatchBackend> {
    backend: B,
    entries: Vec<WatchEntry<B::Handle>>,
    by_id: HashMap<WatchId, SlotIndex>,
    capacity: usize,
    increment: usize,
    growth_steps: usize,
}

impl<B: WatchBackend> WatchRegistry<B> {
    /// Create a registry with `capacity` slots pre-allocated, growing by
    /// `increment` slots at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial allocation fails.
    pub fn new(backend: B, capacity: usize, increment: usize) -> Result<Self> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|e| WatcherError::Growth {
                additional: capacity,
                reason: e.to_string(),
            })?;

        Ok(Self {
            backend,
            entries,
            by_id: HashMap::new(),
            capacity,
            increment: increment.max(1),
            growth_steps: 0,
        })
    }

    /// Start watching `path` and record it.
    ///
    /// If the kernel hands back a descriptor that is already active (the same
    /// directory reached twice), the existing entry is kept and its identifier
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot grow or the kernel refuses the
    /// watch. Both are fatal to the caller.
    pub fn register(&mut self, path: &Path) -> Result<WatchId> {
        if self.entries.len() == self.capacity {
            self.grow()?;
        }

        let handle = self
            .backend
            .add_watch(path)
            .map_err(|e| WatcherError::WatchFailed {
                path: path.display().to_string(),
                registered: self.by_id.len(),
                reason: e.to_string(),
            })?;
        let id = B::watch_id(&handle);

        if let Some(slot) = self.by_id.get(&id) {
            tracing::debug!(
                path = %path.display(),
                existing = %self.entries[slot.0].path.display(),
                %id,
                "Directory already watched"
            );
            return Ok(id);
        }

        let slot = SlotIndex(self.entries.len());
        self.entries.push(WatchEntry {
            id,
            handle: Some(handle),
            path: path.to_path_buf(),
            kind: WatchKind::Directory,
            active: true,
        });
        self.by_id.insert(id, slot);

        tracing::debug!(path = %path.display(), %id, slot = slot.0, "Added watch");
        Ok(id)
    }

    fn grow(&mut self) -> Result<()> {
        self.entries
            .try_reserve_exact(self.increment)
            .map_err(|e| WatcherError::Growth {
                additional: self.increment,
                reason: e.to_string(),
            })?;
        self.capacity += self.increment;
        self.growth_steps += 1;

        tracing::debug!(capacity = self.capacity, "Grew watch table");
        Ok(())
    }

    /// Find the active entry registered under `id`.
    #[must_use]
    pub fn resolve(&self, id: WatchId) -> Option<(&Path, SlotIndex)> {
        let slot = *self.by_id.get(&id)?;
        let entry = &self.entries[slot.0];
        entry.active.then(|| (entry.path.as_path(), slot))
    }

    /// Deactivate the entry at `slot` and ask the kernel to drop its watch.
    ///
    /// Returns `false` if the slot is unknown or already retired. A removal
    /// refused by the kernel (the directory is already gone) is tolerated.
    pub fn retire(&mut self, slot: SlotIndex) -> bool {
        let Some(entry) = self.entries.get_mut(slot.0) else {
            return false;
        };
        if !entry.active {
            return false;
        }

        entry.active = false;
        let path = std::mem::take(&mut entry.path);
        self.by_id.remove(&entry.id);

        if let Some(handle) = entry.handle.take() {
            if let Err(e) = self.backend.remove_watch(handle) {
                tracing::debug!(id = %entry.id, error = %e, "Watch already dropped by kernel");
            }
        }

        tracing::debug!(path = %path.display(), id = %entry.id, slot = slot.0, "Retired watch");
        true
    }

    /// Tombstone every active entry without contacting the backend.
    ///
    /// Used at shutdown, when closing the notification source drops all
    /// kernel watches at once. Calling it again is a no-op.
    pub fn teardown(&mut self) {
        for entry in self.entries.iter_mut().filter(|e| e.active) {
            entry.active = false;
            entry.handle = None;
            entry.path = PathBuf::new();
        }
        self.by_id.clear();
    }

    /// Entry at `slot`, active or not.
    #[must_use]
    pub fn entry(&self, slot: SlotIndex) -> Option<&WatchEntry<B::Handle>> {
        self.entries.get(slot.0)
    }

    /// All entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[WatchEntry<B::Handle>] {
        &self.entries
    }

    /// Number of used slots, including tombstones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no watch was ever registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live watches.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.by_id.len()
    }

    /// Slots available before the next growth step.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Growth steps taken so far.
    #[must_use]
    pub const fn growth_steps(&self) -> usize {
        self.growth_steps
    }

    /// The OS backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeBackend;
    use super::*;

    fn registry(capacity: usize) -> WatchRegistry<FakeBackend> {
        WatchRegistry::new(FakeBackend::default(), capacity, 32).unwrap()
    }

    #[test]
    fn test_resolve_returns_registered_path() {
        let mut reg = registry(8);
        let a = reg.register(Path::new("/srv/a")).unwrap();
        let b = reg.register(Path::new("/srv/a/b")).unwrap();

        assert_eq!(reg.resolve(a).unwrap().0, Path::new("/srv/a"));
        assert_eq!(reg.resolve(b), Some((Path::new("/srv/a/b"), SlotIndex(1))));
        assert!(reg.resolve(WatchId(99)).is_none());
    }

    #[test]
    fn test_retire_tombstones_entry() {
        let mut reg = registry(8);
        let a = reg.register(Path::new("/srv/a")).unwrap();
        let (_, slot) = reg.resolve(a).unwrap();

        assert!(reg.retire(slot));
        assert!(reg.resolve(a).is_none());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.active_count(), 0);

        let entry = reg.entry(slot).unwrap();
        assert!(!entry.is_active());
        assert_eq!(entry.path(), Path::new(""));
        assert_eq!(reg.backend().removed, vec![a]);
    }

    #[test]
    fn test_retire_is_idempotent() {
        let mut reg = registry(8);
        let a = reg.register(Path::new("/srv/a")).unwrap();
        let (_, slot) = reg.resolve(a).unwrap();

        assert!(reg.retire(slot));
        assert!(!reg.retire(slot));
        assert!(!reg.retire(SlotIndex(40)));
        assert_eq!(reg.backend().removed.len(), 1);
    }

    #[test]
    fn test_retire_tolerates_kernel_drop() {
        let mut reg = registry(8);
        let a = reg.register(Path::new("/srv/a")).unwrap();
        reg.backend.live.clear();

        let (_, slot) = reg.resolve(a).unwrap();
        assert!(reg.retire(slot));
        assert!(reg.resolve(a).is_none());
    }

    #[test]
    fn test_retired_id_not_reissued() {
        let mut reg = registry(8);
        let a = reg.register(Path::new("/srv/a")).unwrap();
        let (_, slot) = reg.resolve(a).unwrap();
        reg.retire(slot);

        let b = reg.register(Path::new("/srv/b")).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.resolve(b).unwrap().1, SlotIndex(1));
    }

    #[test]
    fn test_growth_one_step_per_boundary() {
        let mut reg = WatchRegistry::new(FakeBackend::default(), 4, 2).unwrap();
        let paths: Vec<PathBuf> = (0..9).map(|i| PathBuf::from(format!("/d/{i}"))).collect();

        let mut ids = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            ids.push(reg.register(path).unwrap());
            let expected_steps = if i < 4 { 0 } else { (i - 4) / 2 + 1 };
            assert_eq!(reg.growth_steps(), expected_steps, "after {} entries", i + 1);
        }

        assert_eq!(reg.capacity(), 10);
        for (id, path) in ids.iter().zip(&paths) {
            assert_eq!(reg.resolve(*id).unwrap().0, path.as_path());
        }
    }

    #[test]
    fn test_growth_preserves_prefix() {
        let mut reg = WatchRegistry::new(FakeBackend::default(), 1, 32).unwrap();
        reg.register(Path::new("/one")).unwrap();
        let before: Vec<_> = reg.entries().iter().map(|e| (e.id(), e.path().to_path_buf())).collect();

        reg.register(Path::new("/two")).unwrap();
        assert_eq!(reg.growth_steps(), 1);
        assert_eq!(reg.capacity(), 33);

        let after: Vec<_> = reg.entries().iter().map(|e| (e.id(), e.path().to_path_buf())).collect();
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[test]
    fn test_register_failure_is_error() {
        let backend = FakeBackend::failing_after(2);
        let mut reg = WatchRegistry::new(backend, 8, 32).unwrap();
        reg.register(Path::new("/a")).unwrap();
        reg.register(Path::new("/b")).unwrap();

        let err = reg.register(Path::new("/c")).unwrap_err();
        assert!(err.to_string().contains("2 watches already added"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_duplicate_descriptor_keeps_single_entry() {
        #[derive(Debug, Default)]
        struct SameInode;

        impl WatchBackend for SameInode {
            type Handle = i32;
            fn add_watch(&mut self, _: &Path) -> std::io::Result<i32> {
                Ok(5)
            }
            fn remove_watch(&mut self, _: i32) -> std::io::Result<()> {
                Ok(())
            }
            fn watch_id(handle: &i32) -> WatchId {
                WatchId(*handle)
            }
        }

        let mut reg = WatchRegistry::new(SameInode, 4, 4).unwrap();
        let first = reg.register(Path::new("/mnt/x")).unwrap();
        let second = reg.register(Path::new("/mnt/bind/x")).unwrap();

        assert_eq!(first, second);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.resolve(first).unwrap().0, Path::new("/mnt/x"));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut reg = registry(8);
        let a = reg.register(Path::new("/a")).unwrap();
        reg.register(Path::new("/b")).unwrap();

        reg.teardown();
        assert_eq!(reg.active_count(), 0);
        assert!(reg.resolve(a).is_none());
        assert!(reg.entries().iter().all(|e| !e.is_active()));

        reg.teardown();
        assert_eq!(reg.len(), 2);
        assert!(reg.backend().removed.is_empty());
    }
}
