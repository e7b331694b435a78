//! Decoding of raw inotify record streams.
//!
//! A read from an inotify descriptor returns back-to-back records:
//!
//! ```text
//! | wd: i32 | mask: u32 | cookie: u32 | len: u32 | name: [u8; len] |
//! ```
//!
//! `name` is NUL-padded and absent (`len == 0`) for events about the watched
//! directory itself. Fields are read with `from_ne_bytes`, so the buffer needs
//! no particular alignment.

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;

use inotify::EventMask;

use super::backend::WatchId;
use super::events::ChangeEvent;

/// Size of the fixed record header.
pub const HEADER_LEN: usize = 16;

/// Iterator over the records in one read buffer.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    offset: usize,
}

/// Decode every record in `buf`.
#[must_use]
pub const fn decode(buf: &[u8]) -> Decoder<'_> {
    Decoder { buf, offset: 0 }
}

impl Decoder<'_> {
    /// Bytes consumed so far.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    fn field(&self, at: usize) -> [u8; 4] {
        let start = self.offset + at;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.buf[start..start + 4]);
        bytes
    }
}

impl Iterator for Decoder<'_> {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<ChangeEvent> {
        let remaining = self.buf.len() - self.offset;
        if remaining == 0 {
            return None;
        }
        if remaining < HEADER_LEN {
            tracing::warn!(remaining, "Truncated notification header, dropping tail");
            self.offset = self.buf.len();
            return None;
        }

        let wd = i32::from_ne_bytes(self.field(0));
        let mask = u32::from_ne_bytes(self.field(4));
        let name_len = u32::from_ne_bytes(self.field(12)) as usize;

        let name_start = self.offset + HEADER_LEN;
        let Some(name_end) = name_start
            .checked_add(name_len)
            .filter(|end| *end <= self.buf.len())
        else {
            tracing::warn!(name_len, remaining, "Truncated notification name, dropping tail");
            self.offset = self.buf.len();
            return None;
        };

        let raw_name = &self.buf[name_start..name_end];
        let trimmed = raw_name
            .iter()
            .position(|b| *b == 0)
            .map_or(raw_name, |nul| &raw_name[..nul]);
        let name = (!trimmed.is_empty())
            .then(|| OsString::from(std::ffi::OsStr::from_bytes(trimmed)));

        self.offset = name_end;

        Some(ChangeEvent {
            watch: WatchId(wd),
            mask: EventMask::from_bits_truncate(mask),
            name,
        })
    }
}

/// Encode one record the way the kernel lays it out, padding the name with
/// NULs to a multiple of the header alignment.
#[cfg(test)]
pub(crate) fn encode_record(wd: i32, mask: u32, name: &str) -> Vec<u8> {
    let padded = if name.is_empty() {
        0
    } else {
        (name.len() + 1).next_multiple_of(4)
    };
    let mut out = Vec::with_capacity(HEADER_LEN + padded);
    out.extend_from_slice(&wd.to_ne_bytes());
    out.extend_from_slice(&mask.to_ne_bytes());
    out.extend_from_slice(&0u32.to_ne_bytes());
    out.extend_from_slice(&u32::try_from(padded).unwrap().to_ne_bytes());
    out.extend_from_slice(name.as_bytes());
    out.resize(HEADER_LEN + padded, 0);
    out
}
