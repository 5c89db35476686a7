// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timer-driven polling on a background thread.

use crate::domain::{ConfigError, Result};
use crate::ports::{PollTask, PollingStrategy};
use parking_lot::Mutex;
use std::fmt;
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "fixed-interval-polling";

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Polls every `interval` on a dedicated thread.
///
/// Poll failures are logged and delivered to the config's listeners; the
/// thread keeps going. It exits on [`shutdown`](PollingStrategy::shutdown) or
/// once the polling config it drives has been dropped.
///
/// # Examples
///
/// ```rust,no_run
/// use livecfg::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn main() -> livecfg::domain::Result<()> {
/// let strategy = Arc::new(
///     FixedIntervalPollingStrategy::new(Duration::from_secs(30)).with_initial_poll(true),
/// );
/// let config = PollingConfig::builder(
///     || Ok(PollingResponse::no_change()),
///     strategy,
/// )
/// .build()?;
/// # drop(config);
/// # Ok(())
/// # }
/// ```
pub struct FixedIntervalPollingStrategy {
    interval: Duration,
    initial_poll: bool,
    worker: Mutex<Option<Worker>>,
}

impl FixedIntervalPollingStrategy {
    /// Creates a strategy polling every `interval`, first poll after one
    /// interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            initial_poll: false,
            worker: Mutex::new(None),
        }
    }

    /// When `true`, the first poll runs synchronously inside
    /// [`execute`](PollingStrategy::execute) and its failure aborts the build
    /// of the polling config.
    pub fn with_initial_poll(mut self, initial_poll: bool) -> Self {
        self.initial_poll = initial_poll;
        self
    }

    /// The polling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` while the background thread is running.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|worker| !worker.handle.is_finished())
            .unwrap_or(false)
    }
}

impl PollingStrategy for FixedIntervalPollingStrategy {
    fn execute(&self, task: PollTask) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "strategy already drives a polling config".to_string(),
                source: None,
            });
        }

        if self.initial_poll {
            task()?;
        }

        let (stop_tx, stop_rx) = channel::<()>();
        let interval = self.interval;
        let handle = thread::Builder::new()
            .name("livecfg-poller".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                if let Err(error) = task() {
                    if error.is_disconnected() {
                        debug!("Polling config dropped, stopping poller");
                        break;
                    }
                    warn!(%error, "Scheduled poll failed");
                }
            })
            .map_err(|e| ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!("Failed to spawn polling thread: {}", e),
                source: Some(Box::new(e)),
            })?;

        *worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    fn shutdown(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        let _ = worker.stop_tx.send(());

        // The config may be dropped by the poller thread itself.
        if worker.handle.thread().id() == thread::current().id() {
            return;
        }
        if worker.handle.join().is_err() {
            warn!("Polling thread panicked");
        }
    }
}

impl Drop for FixedIntervalPollingStrategy {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for FixedIntervalPollingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedIntervalPollingStrategy")
            .field("interval", &self.interval)
            .field("initial_poll", &self.initial_poll)
            .field("running", &self.is_running())
            .finish()
    }
}
