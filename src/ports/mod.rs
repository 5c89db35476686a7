// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the traits that every config, listener and
//! collaborator implements. Concrete implementations live in the adapters and
//! service layers.

pub mod access_monitor;
pub mod config;
pub mod decoder;
pub mod interpolator;
pub mod listener;
pub mod polling;

// Re-export commonly used types
pub use access_monitor::AccessMonitor;
pub use config::{Config, ConfigExt, IntoConfigArc, Keys};
pub use decoder::Decoder;
pub use interpolator::{Interpolator, Lookup};
pub use listener::ConfigListener;
pub use polling::{PollTask, PollingStrategy, SnapshotReader};
