// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing concrete configs and collaborators.
//!
//! This module contains the leaf configs ([`SettableConfig`], [`MapConfig`],
//! [`PollingConfig`]), the polling strategies that drive the latter, and the
//! default implementations of the decoder, interpolator and access monitor
//! ports.

pub mod decoder;
pub mod interpolator;
pub mod map;
pub mod polling;
pub mod settable;
pub mod strategies;
pub mod usage_tracker;

// Re-export adapters
pub use decoder::DefaultDecoder;
pub use interpolator::DefaultInterpolator;
pub use map::{MapConfig, MapConfigBuilder};
pub use polling::{PollState, PollingConfig, PollingConfigBuilder};
pub use settable::SettableConfig;
#[cfg(feature = "reload")]
pub use strategies::FileChangePollingStrategy;
pub use strategies::{FixedIntervalPollingStrategy, ManualPollingStrategy};
pub use usage_tracker::{UsageTracker, UsageTrackerBuilder};
