// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module holds the value types exchanged between configs and their
//! listeners (changes, snapshots, access records), the error types, and the
//! state every config carries ([`ConfigCore`] with its copy-on-write
//! [`ListenerRegistry`]).

pub mod config_core;
pub mod errors;
pub mod listeners;
pub mod property_change;
pub mod property_details;
pub mod snapshot;

// Re-export commonly used types
pub use config_core::ConfigCore;
pub use errors::{BoxError, ConfigError, DecodeError, Result};
pub use listeners::{ListenerId, ListenerRegistry};
pub use property_change::{ChangeKind, PropertyChange};
pub use property_details::{PropertyDetails, PropertyUsage};
pub use snapshot::{PollingResponse, Snapshot, SnapshotDiff};
