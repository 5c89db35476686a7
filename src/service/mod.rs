// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer composing configs for application code.
//!
//! [`CompositeConfig`] layers configs by precedence, the views in [`views`]
//! narrow or isolate one config, and [`PropertyFactory`] hands out typed,
//! auto-updating handles over any of them.

pub mod composite;
pub mod property;
pub mod views;

// Re-export commonly used types
pub use composite::{CompositeConfig, CompositeConfigBuilder};
pub use property::{Property, PropertyBuilder, PropertyFactory};
pub use views::{normalize_prefix, ConfigViewExt, PrefixedView, PrivateView};
