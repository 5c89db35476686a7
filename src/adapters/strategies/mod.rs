// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling strategies.
//!
//! Each strategy implements [`PollingStrategy`](crate::ports::PollingStrategy)
//! and decides which thread runs a polling config's refresh and when:
//!
//! - [`ManualPollingStrategy`]: the caller triggers each poll.
//! - [`FixedIntervalPollingStrategy`]: a background thread polls on a timer.
//! - `FileChangePollingStrategy` (feature `reload`): polls when a file changes.

#[cfg(feature = "reload")]
pub mod file_change;
pub mod fixed_interval;
pub mod manual;

#[cfg(feature = "reload")]
pub use file_change::FileChangePollingStrategy;
pub use fixed_interval::FixedIntervalPollingStrategy;
pub use manual::ManualPollingStrategy;
