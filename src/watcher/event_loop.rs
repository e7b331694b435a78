//! Wait/drain loop over the notification descriptor.
//!
//! WAITING: parked on the reactor until the descriptor is readable, or until
//! the shutdown future completes. DRAINING: read and dispatch until the read
//! would block, then back to WAITING. There is no timeout.

use std::fs::File;
use std::future::Future;
use std::io::{self, Read, Write};
use std::os::fd::AsFd;

use tokio::io::unix::{AsyncFd, AsyncFdReadyGuard};

use super::backend::WatchBackend;
use super::decoder::decode;
use super::handler::{DispatchStats, Dispatcher};
use crate::error::WatcherError;
use crate::Result;

/// Bytes requested per read; fits several maximum-size records.
pub const READ_BUFFER_LEN: usize = 4096;

/// Drives a [`Dispatcher`] from a non-blocking notification descriptor.
#[derive(Debug)]
pub struct EventLoop<B: WatchBackend, W: Write> {
    source: AsyncFd<File>,
    dispatcher: Dispatcher<B, W>,
    buf: Vec<u8>,
}

impl<B: WatchBackend, W: Write> EventLoop<B, W> {
    /// Register a duplicate of `source` with the runtime's reactor.
    ///
    /// `source` must already be in non-blocking mode. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be duplicated or registered.
    pub fn new(source: &impl AsFd, dispatcher: Dispatcher<B, W>) -> Result<Self> {
        let fd = source
            .as_fd()
            .try_clone_to_owned()
            .map_err(|e| WatcherError::init("notification descriptor", e))?;
        let file = File::from(fd);
        // SAFETY: the `File` owns the duplicated descriptor and moves into the
        // `AsyncFd`, so it stays open and unchanged for as long as it is registered.
        #[allow(unsafe_code)]
        let source = unsafe { AsyncFd::register(file) }
            .map_err(|e| WatcherError::init("event poller", e))?;

        Ok(Self {
            source,
            dispatcher,
            buf: vec![0; READ_BUFFER_LEN],
        })
    }

    /// Run until `shutdown` completes, then tear the watch table down.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting or reading fails for any reason other than
    /// would-block, or if the output cannot be written.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<DispatchStats>
    where
        F: Future<Output = ()>,
    {
        let Self {
            source,
            dispatcher,
            buf,
        } = self;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                ready = source.readable() => {
                    let mut guard = ready.map_err(|e| WatcherError::Read(e.to_string()))?;
                    drain(&mut guard, buf, dispatcher)?;
                }
            }
        }

        dispatcher.flush()?;
        dispatcher.shutdown();
        Ok(dispatcher.stats())
    }

    /// The dispatcher and its watch table.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<B, W> {
        &self.dispatcher
    }
}

fn drain<B: WatchBackend, W: Write>(
    guard: &mut AsyncFdReadyGuard<'_, File>,
    buf: &mut [u8],
    dispatcher: &mut Dispatcher<B, W>,
) -> Result<()> {
    tracing::trace!("Draining notifications");

    loop {
        let read = guard.try_io(|inner| {
            let mut file = inner.get_ref();
            file.read(&mut buf[..])
        });

        match read {
            Ok(Ok(0)) => {
                guard.clear_ready();
                break;
            }
            Ok(Ok(n)) => {
                for event in decode(&buf[..n]) {
                    dispatcher.dispatch(&event)?;
                }
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {}
            Ok(Err(e)) => return Err(WatcherError::Read(e.to_string()).into()),
            Err(_would_block) => break,
        }
    }

    dispatcher.flush()
}
