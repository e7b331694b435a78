//! Kernel watch registration.
//!
//! The registry talks to the OS through [`WatchBackend`] so it can be
//! built against an in-memory backend in tests.

use std::fmt;
use std::io;
use std::path::Path;

use inotify::{WatchDescriptor, WatchMask, Watches};

/// Kernel watch descriptor number, as carried by every notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub i32);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wd:{}", self.0)
    }
}

/// Events every directory watch subscribes to.
#[must_use]
pub fn watch_mask() -> WatchMask {
    WatchMask::ATTRIB
        | WatchMask::CREATE
        | WatchMask::DELETE
        | WatchMask::DELETE_SELF
        | WatchMask::MOVED_TO
}

/// Registers and removes kernel watches.
pub trait WatchBackend {
    /// Handle needed to remove a watch later.
    type Handle: fmt::Debug;

    /// Start watching `path` with [`watch_mask`].
    ///
    /// # Errors
    ///
    /// Returns the OS error when the watch cannot be added.
    fn add_watch(&mut self, path: &Path) -> io::Result<Self::Handle>;

    /// Stop watching. The kernel may already have dropped the watch.
    ///
    /// # Errors
    ///
    /// Returns the OS error when removal fails.
    fn remove_watch(&mut self, handle: Self::Handle) -> io::Result<()>;

    /// Descriptor number used to correlate decoded records with the handle.
    fn watch_id(handle: &Self::Handle) -> WatchId;
}

/// Backend over a live inotify instance.
#[derive(Clone)]
pub struct InotifyBackend {
    watches: Watches,
}

impl fmt::Debug for InotifyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InotifyBackend").finish_non_exhaustive()
    }
}

impl InotifyBackend {
    /// Wrap the watch handle of an inotify instance.
    #[must_use]
    pub const fn new(watches: Watches) -> Self {
        Self { watches }
    }
}

impl WatchBackend for InotifyBackend {
    type Handle = WatchDescriptor;

    fn add_watch(&mut self, path: &Path) -> io::Result<WatchDescriptor> {
        self.watches.add(path, watch_mask())
    }

    fn remove_watch(&mut self, handle: WatchDescriptor) -> io::Result<()> {
        self.watches.remove(handle)
    }

    fn watch_id(handle: &WatchDescriptor) -> WatchId {
        WatchId(handle.get_watch_descriptor_id())
    }
}
