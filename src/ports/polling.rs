// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling strategy and snapshot reader definitions.
//!
//! A polling config separates *what* to fetch (a [`SnapshotReader`]) from
//! *when* to fetch it (a [`PollingStrategy`]). The config hands the strategy a
//! [`PollTask`] that runs one complete fetch-diff-notify cycle; the strategy
//! decides which thread calls it and how often.

use crate::domain::{BoxError, PollingResponse, Result};
use std::sync::Arc;

/// Fetches a complete snapshot from an external source.
pub type SnapshotReader =
    Arc<dyn Fn() -> std::result::Result<PollingResponse, BoxError> + Send + Sync>;

/// One fetch-diff-notify cycle of a polling config.
///
/// Returns a [`SourceError`](crate::domain::ConfigError::SourceError) for which
/// [`is_disconnected`](crate::domain::ConfigError::is_disconnected) is `true`
/// once the config has been dropped; strategies should stop calling it then.
pub type PollTask = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Decides when a polling config refreshes.
///
/// # Examples
///
/// ```rust
/// use livecfg::domain::Result;
/// use livecfg::ports::{PollTask, PollingStrategy};
///
/// /// Polls exactly once, at registration.
/// struct Once;
///
/// impl PollingStrategy for Once {
///     fn execute(&self, task: PollTask) -> Result<()> {
///         task()
///     }
///
///     fn shutdown(&self) {}
/// }
/// ```
pub trait PollingStrategy: Send + Sync {
    /// Takes ownership of `task` and starts driving it.
    ///
    /// Called once, while the polling config is being built. An error aborts
    /// the build.
    fn execute(&self, task: PollTask) -> Result<()>;

    /// Stops driving the task. Must be idempotent.
    fn shutdown(&self);
}
