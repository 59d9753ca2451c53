//! Fixed-interval ticker driving the collection loops.
//!
//! The callback runs once immediately on `start`, then once per interval on a
//! dedicated thread. Each invocation is expected to finish well inside the
//! interval (60 s ticks vs ~2 s of work); no overlap handling exists.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;

/// A cancellable fixed-interval timer.
///
/// Failure policy: a panicking callback is caught and logged and ticking
/// continues. A single bad tick must never silently kill the loop.
pub struct Ticker {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking. The callback is invoked once immediately, then every
    /// `interval` until [`Ticker::stop`] is called.
    pub fn start<F>(interval: Duration, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = std::thread::spawn(move || loop {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                tracing::error!("tick callback panicked; continuing");
            }

            // Waiting on the stop channel doubles as the interval sleep, so a
            // stop request cancels an already-scheduled invocation.
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Stop ticking. No further invocation will occur, including one already
    /// scheduled. Blocks until the tick thread exits.
    pub fn stop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
