// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access instrumentation port.

use crate::domain::PropertyDetails;

/// Receives one call per instrumented property read.
///
/// Configs that were built with a monitor call [`register_usage`] from
/// `get_raw_property` and `for_each_property`; the `_uninstrumented`
/// variants never do.
///
/// [`register_usage`]: AccessMonitor::register_usage
pub trait AccessMonitor: Send + Sync {
    /// Records that `details` was read.
    fn register_usage(&self, details: PropertyDetails);
}

impl<F> AccessMonitor for F
where
    F: Fn(PropertyDetails) + Send + Sync,
{
    fn register_usage(&self, details: PropertyDetails) {
        self(details)
    }
}
