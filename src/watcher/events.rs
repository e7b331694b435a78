//! Decoded change events and their textual rendering.

use std::ffi::OsString;
use std::path::Path;

use inotify::EventMask;

use super::backend::WatchId;

/// Labelled mask bits, in output order.
const LABELS: &[(EventMask, &str)] = &[
    (EventMask::ATTRIB, "ATTRIB"),
    (EventMask::CREATE, "CREATE"),
    (EventMask::MOVED_TO, "MOVED_TO"),
    (EventMask::DELETE, "DELETE"),
    (EventMask::DELETE_SELF, "DELETE_SELF"),
];

/// One notification record, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Watch that produced the record.
    pub watch: WatchId,
    /// Raw event mask, including `ISDIR`.
    pub mask: EventMask,
    /// Affected child, absent for events about the watched directory itself.
    pub name: Option<OsString>,
}

impl ChangeEvent {
    /// Whether the affected object is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.mask.contains(EventMask::ISDIR)
    }

    /// Whether the watched directory itself was removed.
    #[must_use]
    pub fn is_self_deletion(&self) -> bool {
        self.mask.contains(EventMask::DELETE_SELF)
    }

    /// Whether a regular file appeared in the directory, by creation or move.
    #[must_use]
    pub fn introduces_file(&self) -> bool {
        self.mask.intersects(EventMask::CREATE | EventMask::MOVED_TO)
            && !self.is_dir()
            && self.name.is_some()
    }

    /// Labels of the mask bits that are set.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        LABELS
            .iter()
            .filter(|(bit, _)| self.mask.contains(*bit))
            .map(|(_, label)| *label)
            .collect()
    }

    /// Render the output line, given the owning directory if it is known.
    ///
    /// Records about a resolved watch itself are labelled `[directory]` whether
    /// or not the kernel set `ISDIR`.
    ///
    /// Returns `None` for records that carry none of the labelled bits
    /// (queue overflow, watch-removed notices).
    #[must_use]
    pub fn render(&self, dir: Option<&Path>) -> Option<String> {
        let tags = self.tags();
        if tags.is_empty() {
            return None;
        }

        let target = match (dir, &self.name) {
            (Some(dir), Some(name)) => dir.join(name).display().to_string(),
            (Some(dir), None) => dir.display().to_string(),
            (None, Some(name)) => name.to_string_lossy().into_owned(),
            (None, None) => "?".to_string(),
        };
        // A nameless record is about the watch itself, and only directories are watched.
        let about_watch = dir.is_some() && self.name.is_none();
        let kind = if self.is_dir() || about_watch {
            "directory"
        } else {
            "file"
        };

        Some(format!("{}: {} [{}]", tags.join(" "), target, kind))
    }
}
