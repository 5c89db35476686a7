// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value-level change notifications.
//!
//! A [`PropertyChange`] describes one key whose raw value was added, updated
//! or removed. Structural changes (a child config joining or leaving a
//! composite) are not property changes; they are delivered through the
//! `on_config_added`/`on_config_removed` listener callbacks instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a value-level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The key was absent and now has a value.
    Added,
    /// The key had a value and was written again.
    Updated,
    /// The key had a value and is now absent.
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Added => "added",
            ChangeKind::Updated => "updated",
            ChangeKind::Removed => "removed",
        };
        f.write_str(label)
    }
}

/// A change to the raw value of a single key.
///
/// # Examples
///
/// ```
/// use livecfg::domain::{ChangeKind, PropertyChange};
///
/// let change = PropertyChange::updated("db.pool", "16");
/// assert_eq!(change.key(), "db.pool");
/// assert_eq!(change.kind(), ChangeKind::Updated);
/// assert_eq!(change.value(), Some("16"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyChange {
    key: String,
    kind: ChangeKind,
    value: Option<String>,
}

impl PropertyChange {
    /// A key that appeared with `value`.
    pub fn added(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ChangeKind::Added,
            value: Some(value.into()),
        }
    }

    /// A key whose value became `value`.
    pub fn updated(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ChangeKind::Updated,
            value: Some(value.into()),
        }
    }

    /// A key that disappeared.
    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ChangeKind::Removed,
            value: None,
        }
    }

    /// Returns the key that changed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the kind of change.
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns the new raw value, `None` for removals.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the same change re-keyed to `key`.
    ///
    /// Scoped views use this to translate a delegate key into a view-local key.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: self.kind,
            value: self.value.clone(),
        }
    }
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}({}={})", self.kind, self.key, value),
            None => write!(f, "{}({})", self.kind, self.key),
        }
    }
}
