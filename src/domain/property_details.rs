// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records produced by access instrumentation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One instrumented read: the key, the id its source assigned to it and the
/// raw value observed at read time.
///
/// # Examples
///
/// ```
/// use livecfg::domain::PropertyDetails;
///
/// let details = PropertyDetails::new("foo.prop1", Some("1".to_string()), "foo-value");
/// assert_eq!(details.key(), "foo.prop1");
/// assert_eq!(details.id(), Some("1"));
/// assert_eq!(details.value(), "foo-value");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDetails {
    key: String,
    id: Option<String>,
    value: String,
}

impl PropertyDetails {
    /// Creates a new access record.
    pub fn new(key: impl Into<String>, id: Option<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id,
            value: value.into(),
        }
    }

    /// Returns the fully-qualified key that was read.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the source-assigned id, if the source tracks one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the raw value observed.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for PropertyDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}[{}]={}", self.key, id, self.value),
            None => write!(f, "{}={}", self.key, self.value),
        }
    }
}

/// Aggregated access count for one [`PropertyDetails`], as flushed by a
/// usage tracker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyUsage {
    /// The access record
    pub details: PropertyDetails,
    /// How many times it was read since the last flush
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_with_id() {
        let details = PropertyDetails::new("a", Some("7".to_string()), "x");
        assert_eq!(details.to_string(), "a[7]=x");
    }

    #[test]
    fn test_display_without_id() {
        let details = PropertyDetails::new("a", None, "x");
        assert_eq!(details.to_string(), "a=x");
    }

    #[test]
    fn test_hash_distinguishes_values() {
        let mut set = HashSet::new();
        set.insert(PropertyDetails::new("a", None, "1"));
        set.insert(PropertyDetails::new("a", None, "1"));
        set.insert(PropertyDetails::new("a", None, "2"));
        assert_eq!(set.len(), 2);
    }
}
