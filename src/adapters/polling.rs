// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config backed by snapshots pulled from an external reader.
//!
//! A [`PollingConfig`] owns the latest [`Snapshot`] returned by its reader.
//! Each poll runs the same sequence whatever triggered it: fetch a snapshot,
//! diff it against the current one, publish it, then notify listeners with
//! one event per removed, updated and added key. A failed fetch keeps the
//! current snapshot and is reported to listeners through `on_error`.
//!
//! The config does not decide when to poll; its [`PollingStrategy`] does.

use crate::domain::{
    ConfigCore, ConfigError, PollingResponse, PropertyDetails, Result, Snapshot,
};
use crate::ports::{AccessMonitor, Config, Keys, PollTask, PollingStrategy, SnapshotReader};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Where a polling config is in its fetch-diff-notify cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    /// No poll is running.
    Idle,
    /// The reader is being called.
    Fetching,
    /// The new snapshot is being compared and listeners notified.
    Diffing,
}

impl PollState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PollState::Fetching,
            2 => PollState::Diffing,
            _ => PollState::Idle,
        }
    }
}

/// Resets the state to idle however the poll ends.
struct StateGuard<'a>(&'a AtomicU8);

impl<'a> StateGuard<'a> {
    fn enter(state: &'a AtomicU8, phase: PollState) -> Self {
        state.store(phase as u8, Ordering::Release);
        StateGuard(state)
    }

    fn advance(&self, phase: PollState) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(PollState::Idle as u8, Ordering::Release);
    }
}

/// A config refreshed from full snapshots of an external source.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> livecfg::domain::Result<()> {
/// let strategy = Arc::new(ManualPollingStrategy::new());
/// let config = PollingConfig::builder(
///     || {
///         Ok(PollingResponse::for_snapshot(
///             vec![("timeout".to_string(), "30".to_string())],
///             vec![],
///         ))
///     },
///     strategy.clone(),
/// )
/// .name("remote")
/// .build()?;
///
/// assert_eq!(config.get_integer("timeout")?, None);
/// strategy.fire()?;
/// assert_eq!(config.get_integer("timeout")?, Some(30));
/// # Ok(())
/// # }
/// ```
pub struct PollingConfig {
    core: ConfigCore,
    reader: SnapshotReader,
    strategy: Arc<dyn PollingStrategy>,
    monitor: Option<Arc<dyn AccessMonitor>>,
    current: ArcSwap<Snapshot>,
    poll_lock: Mutex<()>,
    state: AtomicU8,
    last_updated: Mutex<Option<SystemTime>>,
    poll_count: AtomicU64,
    error_count: AtomicU64,
}

impl PollingConfig {
    /// Starts building a polling config from a reader and a strategy.
    pub fn builder<R>(reader: R, strategy: Arc<dyn PollingStrategy>) -> PollingConfigBuilder
    where
        R: Fn() -> std::result::Result<PollingResponse, crate::domain::BoxError>
            + Send
            + Sync
            + 'static,
    {
        PollingConfigBuilder {
            name: None,
            reader: Arc::new(reader),
            strategy,
            monitor: None,
        }
    }

    /// Runs one fetch-diff-notify cycle on the calling thread.
    ///
    /// Concurrent calls are serialized. A reader failure is returned after
    /// being delivered to listeners.
    pub fn refresh(&self) -> Result<()> {
        let _serial = self.poll_lock.lock();
        let state = StateGuard::enter(&self.state, PollState::Fetching);

        let response = match (self.reader)() {
            Ok(response) => response,
            Err(source) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                let error = ConfigError::FetchError {
                    source_name: self.name().to_string(),
                    source,
                };
                warn!(config = self.name(), %error, "Keeping previous snapshot");
                self.core.fire_error(&error, self);
                return Err(error);
            }
        };

        self.poll_count.fetch_add(1, Ordering::Relaxed);
        let Some(next) = response.into_snapshot() else {
            debug!(config = self.name(), "Reader reported no change");
            return Ok(());
        };

        state.advance(PollState::Diffing);
        let diff = self.current.load().diff(&next);
        self.current.store(Arc::new(next));
        *self.last_updated.lock() = Some(SystemTime::now());

        debug!(
            config = self.name(),
            removed = diff.removed.len(),
            updated = diff.updated.len(),
            added = diff.added.len(),
            "Applied snapshot"
        );
        for change in diff.into_changes() {
            self.core.fire_config_updated(self, &change);
        }
        Ok(())
    }

    /// The snapshot currently served.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Current phase of the poll cycle.
    pub fn poll_state(&self) -> PollState {
        PollState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// When the last snapshot was applied, if any.
    pub fn last_updated(&self) -> Option<SystemTime> {
        *self.last_updated.lock()
    }

    /// Number of successful fetches, including "no change" responses.
    pub fn poll_count(&self) -> u64 {
        self.poll_count.load(Ordering::Relaxed)
    }

    /// Number of failed fetches.
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    fn record(&self, snapshot: &Snapshot, key: &str, value: &str) {
        if let Some(monitor) = &self.monitor {
            monitor.register_usage(PropertyDetails::new(
                key,
                snapshot.id(key).map(str::to_string),
                value,
            ));
        }
    }
}

impl Config for PollingConfig {
    fn core(&self) -> &ConfigCore {
        &self.core
    }

    fn get_raw_property(&self, key: &str) -> Option<String> {
        let snapshot = self.current.load();
        let value = snapshot.value(key)?;
        self.record(&snapshot, key, value);
        Some(value.to_string())
    }

    fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String> {
        self.current.load().value(key).map(str::to_string)
    }

    fn keys(&self) -> Keys {
        self.current.load().keys().map(str::to_string).collect()
    }

    fn for_each_property(&self, f: &mut dyn FnMut(&str, &str)) {
        let snapshot = self.current.load_full();
        for (key, value) in snapshot.iter() {
            self.record(&snapshot, key, value);
            f(key, value);
        }
    }

    fn for_each_property_uninstrumented(&self, f: &mut dyn FnMut(&str, &str)) {
        let snapshot = self.current.load_full();
        for (key, value) in snapshot.iter() {
            f(key, value);
        }
    }

    fn instrumentation_enabled(&self) -> bool {
        self.monitor.is_some()
    }

    fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Drop for PollingConfig {
    fn drop(&mut self) {
        self.strategy.shutdown();
    }
}

impl fmt::Debug for PollingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingConfig")
            .field("name", &self.name())
            .field("keys", &self.current.load().len())
            .field("state", &self.poll_state())
            .field("poll_count", &self.poll_count())
            .field("error_count", &self.error_count())
            .field("instrumented", &self.monitor.is_some())
            .finish()
    }
}

/// Builder for [`PollingConfig`].
pub struct PollingConfigBuilder {
    name: Option<String>,
    reader: SnapshotReader,
    strategy: Arc<dyn PollingStrategy>,
    monitor: Option<Arc<dyn AccessMonitor>>,
}

impl PollingConfigBuilder {
    /// Sets the config name. Defaults to `polling`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Records every instrumented read with `monitor`.
    pub fn access_monitor(mut self, monitor: Arc<dyn AccessMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Builds the config and hands its poll task to the strategy.
    ///
    /// Fails if the strategy refuses the task, for instance because its
    /// synchronous initial poll failed.
    pub fn build(self) -> Result<Arc<PollingConfig>> {
        let name = self.name.unwrap_or_else(|| "polling".to_string());
        let config = Arc::new(PollingConfig {
            core: ConfigCore::new(name.clone()),
            reader: self.reader,
            strategy: self.strategy,
            monitor: self.monitor,
            current: ArcSwap::from_pointee(Snapshot::default()),
            poll_lock: Mutex::new(()),
            state: AtomicU8::new(PollState::Idle as u8),
            last_updated: Mutex::new(None),
            poll_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        });

        let weak = Arc::downgrade(&config);
        let task: PollTask = Arc::new(move || match weak.upgrade() {
            Some(config) => config.refresh(),
            None => Err(ConfigError::disconnected(name.clone())),
        });
        config.strategy.execute(task)?;
        Ok(config)
    }
}
