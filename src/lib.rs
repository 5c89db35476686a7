// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime configuration with live change propagation.
//!
//! `livecfg` resolves string properties from layered sources and tells the
//! application when they change. Values are stored raw and decoded on read,
//! references such as `${other.key}` are interpolated on read, and every
//! mutation is pushed synchronously to the listeners of the config it happened
//! in and of every composite or view built on top of it.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Value types and shared state (`PropertyChange`,
//!   `Snapshot`, `PropertyDetails`, `ConfigCore`, errors)
//! - **Ports**: Trait definitions (`Config`, `ConfigListener`, `Decoder`,
//!   `Interpolator`, `AccessMonitor`, `PollingStrategy`)
//! - **Adapters**: Leaf configs (`SettableConfig`, `MapConfig`,
//!   `PollingConfig`), polling strategies and the default collaborators
//! - **Service**: Composition on top of any config (`CompositeConfig`,
//!   `PrefixedView`, `PrivateView`, `PropertyFactory`)
//!
//! # Features
//!
//! - **Layering**: A composite answers each key from its first child that has
//!   it, then from its parent
//! - **Scoped views**: Prefix-narrowed and decoder-isolated views that release
//!   their subscription when dropped
//! - **Polling**: Snapshots fetched manually, on an interval or on file change,
//!   diffed into per-key events
//! - **Property handles**: Typed handles that always read the current value and
//!   share one subscription per key
//! - **Instrumentation**: Optional per-read usage records for polled sources
//!
//! # Feature Flags
//!
//! - `reload`: Enable the file-change polling strategy
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use livecfg::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> livecfg::domain::Result<()> {
//! let overrides = Arc::new(SettableConfig::with_name("overrides"));
//! let defaults = Arc::new(
//!     MapConfig::builder()
//!         .put("server.port", 8080)
//!         .put("server.host", "localhost")
//!         .build(),
//! );
//!
//! let app = CompositeConfig::builder()
//!     .name("app")
//!     .with_config("overrides", overrides.clone())?
//!     .with_config("defaults", defaults)?
//!     .build()?;
//!
//! let server = app.prefixed_view("server");
//! let factory = PropertyFactory::new(server);
//! let port = factory.get_property("port").as_integer(0);
//! assert_eq!(port.get(), 8080);
//!
//! overrides.set_property("server.port", 9090);
//! assert_eq!(port.get(), 9090);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ChangeKind, ConfigError, PollingResponse, PropertyChange, PropertyDetails, Result,
    };
    pub use crate::ports::{AccessMonitor, Config, ConfigExt, ConfigListener};

    pub use crate::adapters::{
        FixedIntervalPollingStrategy, ManualPollingStrategy, MapConfig, PollingConfig,
        SettableConfig, UsageTracker,
    };
    #[cfg(feature = "reload")]
    pub use crate::adapters::FileChangePollingStrategy;

    pub use crate::service::{
        CompositeConfig, ConfigViewExt, PrefixedView, PrivateView, Property, PropertyFactory,
    };
}
