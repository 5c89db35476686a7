// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpolator trait definition.

use crate::domain::Result;

/// Resolves a referenced key to its raw, uninterpolated value.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Substitutes `${key}`-style references inside a raw value.
///
/// Implementations look referenced keys up through `lookup` and resolve the
/// results recursively. How unresolved references are treated is up to the
/// implementation, but reference cycles must end in
/// [`ConfigError::InterpolationCycle`](crate::domain::ConfigError::InterpolationCycle)
/// rather than loop.
pub trait Interpolator: Send + Sync {
    /// Resolves `raw`, the value stored under `key`.
    fn resolve(&self, key: &str, raw: &str, lookup: Lookup<'_>) -> Result<String>;
}
