// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling triggered by file system changes.
//!
//! This strategy monitors one file and runs the polling config's refresh
//! whenever the file is modified. It includes debouncing so that editors
//! writing a file in several steps trigger a single poll.

use crate::domain::{ConfigError, Result};
use crate::ports::{PollTask, PollingStrategy};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
const EVENT_WAIT: Duration = Duration::from_millis(100);

struct Running {
    _watcher: RecommendedWatcher,
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Polls whenever a watched file changes.
///
/// # Examples
///
/// ```rust,no_run
/// use livecfg::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> livecfg::domain::Result<()> {
/// let strategy = Arc::new(FileChangePollingStrategy::new("/etc/app/app.properties", None)?);
/// let config = PollingConfig::builder(
///     || Ok(PollingResponse::no_change()),
///     strategy,
/// )
/// .build()?;
/// # drop(config);
/// # Ok(())
/// # }
/// ```
pub struct FileChangePollingStrategy {
    file_path: PathBuf,
    canonical_path: Option<PathBuf>,
    debounce_delay: Duration,
    initial_poll: bool,
    running: Mutex<Option<Running>>,
}

impl FileChangePollingStrategy {
    /// Creates a strategy for `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - File to watch; must exist
    /// * `debounce_delay` - Minimum time between two polls (default 500ms)
    pub fn new(path: impl AsRef<Path>, debounce_delay: Option<Duration>) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        if !file_path.exists() {
            return Err(ConfigError::WatcherError {
                message: format!("File does not exist: {}", file_path.display()),
                source: None,
            });
        }

        Ok(Self {
            canonical_path: file_path.canonicalize().ok(),
            file_path,
            debounce_delay: debounce_delay.unwrap_or(DEFAULT_DEBOUNCE),
            initial_poll: true,
            running: Mutex::new(None),
        })
    }

    /// Whether to poll once synchronously when the config is built.
    /// Enabled by default.
    pub fn with_initial_poll(mut self, initial_poll: bool) -> Self {
        self.initial_poll = initial_poll;
        self
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// The debounce delay.
    pub fn debounce_delay(&self) -> Duration {
        self.debounce_delay
    }

    fn watch_dir(&self) -> Result<PathBuf> {
        // Watching files directly is unreliable across editors that replace them.
        match self.file_path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Ok(PathBuf::from(".")),
            Some(parent) => Ok(parent.to_path_buf()),
            None => Err(ConfigError::WatcherError {
                message: "Failed to get parent directory".to_string(),
                source: None,
            }),
        }
    }
}

impl PollingStrategy for FileChangePollingStrategy {
    fn execute(&self, task: PollTask) -> Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(ConfigError::WatcherError {
                message: "Watcher is already running".to_string(),
                source: None,
            });
        }

        if self.initial_poll {
            task()?;
        }

        let (event_tx, event_rx) = channel::<notify::Result<Event>>();
        let (stop_tx, stop_rx) = channel::<()>();

        let mut watcher =
            RecommendedWatcher::new(event_tx, notify::Config::default()).map_err(|e| {
                ConfigError::WatcherError {
                    message: format!("Failed to create file watcher: {}", e),
                    source: Some(Box::new(e)),
                }
            })?;
        watcher
            .watch(&self.watch_dir()?, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::WatcherError {
                message: format!("Failed to start watching: {}", e),
                source: Some(Box::new(e)),
            })?;

        let targets: Vec<PathBuf> = std::iter::once(self.file_path.clone())
            .chain(self.canonical_path.clone())
            .collect();
        let debounce_delay = self.debounce_delay;

        let handle = thread::Builder::new()
            .name("livecfg-file-poller".to_string())
            .spawn(move || {
                let mut last_poll: Option<Instant> = None;
                loop {
                    match stop_rx.try_recv() {
                        Err(TryRecvError::Empty) => {}
                        Ok(()) | Err(TryRecvError::Disconnected) => break,
                    }

                    let event = match event_rx.recv_timeout(EVENT_WAIT) {
                        Ok(Ok(event)) => event,
                        Ok(Err(error)) => {
                            warn!(%error, "File watcher reported an error");
                            continue;
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    };
                    if !event.paths.iter().any(|p| targets.contains(p)) {
                        continue;
                    }

                    let now = Instant::now();
                    let due = last_poll
                        .map(|last| now.duration_since(last) >= debounce_delay)
                        .unwrap_or(true);
                    if !due {
                        continue;
                    }
                    last_poll = Some(now);

                    if let Err(error) = task() {
                        if error.is_disconnected() {
                            debug!("Polling config dropped, stopping file poller");
                            break;
                        }
                        warn!(%error, "Poll after file change failed");
                    }
                }
            })
            .map_err(|e| ConfigError::WatcherError {
                message: format!("Failed to spawn watcher thread: {}", e),
                source: Some(Box::new(e)),
            })?;

        *running = Some(Running {
            _watcher: watcher,
            stop_tx,
            handle,
        });
        Ok(())
    }

    fn shutdown(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        let _ = running.stop_tx.send(());
        if running.handle.thread().id() == thread::current().id() {
            return;
        }
        if running.handle.join().is_err() {
            warn!("File poller thread panicked");
        }
    }
}

impl Drop for FileChangePollingStrategy {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FileChangePollingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileChangePollingStrategy")
            .field("file_path", &self.file_path)
            .field("debounce_delay", &self.debounce_delay)
            .field("running", &self.running.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    #[test]
    fn test_nonexistent_file() {
        let strategy = FileChangePollingStrategy::new("/nonexistent/path/to/app.properties", None);
        assert!(matches!(strategy, Err(ConfigError::WatcherError { .. })));
    }

    #[test]
    fn test_custom_debounce() {
        let temp_file = NamedTempFile::new().unwrap();
        let strategy =
            FileChangePollingStrategy::new(temp_file.path(), Some(Duration::from_secs(1))).unwrap();
        assert_eq!(strategy.debounce_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_execute_and_shutdown() {
        let temp_file = NamedTempFile::new().unwrap();
        let strategy = FileChangePollingStrategy::new(temp_file.path(), None).unwrap();
        assert!(strategy.execute(Arc::new(|| Ok(()))).is_ok());
        assert!(strategy.execute(Arc::new(|| Ok(()))).is_err());
        strategy.shutdown();
        strategy.shutdown();
    }
}
