// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable key/value/id captures taken by a polling source.
//!
//! A [`Snapshot`] is what one successful poll produced. Two consecutive
//! snapshots are compared with [`Snapshot::diff`]; the resulting
//! [`SnapshotDiff`] lists the keys that were removed, updated and added, each
//! in key order. Ids are tracked alongside values but an id change on its own
//! is not an update.

use super::property_change::PropertyChange;
use std::collections::{BTreeMap, HashMap};

/// What a snapshot reader returns from one fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingResponse {
    snapshot: Option<Snapshot>,
}

impl PollingResponse {
    /// A full snapshot of values and their source-assigned ids.
    ///
    /// Ids are optional; keys missing from `ids` are recorded without one.
    pub fn for_snapshot<V, I>(values: V, ids: I) -> Self
    where
        V: IntoIterator<Item = (String, String)>,
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            snapshot: Some(Snapshot::new(values, ids)),
        }
    }

    /// The reader has nothing new; the previous snapshot stays in place.
    pub fn no_change() -> Self {
        Self { snapshot: None }
    }

    /// Returns `true` if the reader reported a full snapshot.
    pub fn has_data(&self) -> bool {
        self.snapshot.is_some()
    }

    pub(crate) fn into_snapshot(self) -> Option<Snapshot> {
        self.snapshot
    }
}

/// An immutable capture of a source at one poll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    values: BTreeMap<String, String>,
    ids: HashMap<String, String>,
}

impl Snapshot {
    /// Builds a snapshot from values and ids. Ids for keys without a value
    /// are dropped.
    pub fn new<V, I>(values: V, ids: I) -> Self
    where
        V: IntoIterator<Item = (String, String)>,
        I: IntoIterator<Item = (String, String)>,
    {
        let values: BTreeMap<String, String> = values.into_iter().collect();
        let ids = ids
            .into_iter()
            .filter(|(key, _)| values.contains_key(key))
            .collect();
        Self { values, ids }
    }

    /// Returns the value recorded for `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the id recorded for `key`.
    pub fn id(&self, key: &str) -> Option<&str> {
        self.ids.get(key).map(String::as_str)
    }

    /// Iterates keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Compares `self` (the previous capture) against `next`.
    ///
    /// # Examples
    ///
    /// ```
    /// use livecfg::domain::Snapshot;
    ///
    /// let pairs = |items: &[(&str, &str)]| {
    ///     items
    ///         .iter()
    ///         .map(|(k, v)| (k.to_string(), v.to_string()))
    ///         .collect::<Vec<_>>()
    /// };
    /// let old = Snapshot::new(pairs(&[("a", "1"), ("b", "2")]), vec![]);
    /// let new = Snapshot::new(pairs(&[("b", "3"), ("c", "4")]), vec![]);
    ///
    /// let diff = old.diff(&new);
    /// assert_eq!(diff.removed, vec!["a".to_string()]);
    /// assert_eq!(diff.updated, vec![("b".to_string(), "3".to_string())]);
    /// assert_eq!(diff.added, vec![("c".to_string(), "4".to_string())]);
    /// ```
    pub fn diff(&self, next: &Snapshot) -> SnapshotDiff {
        let removed = self
            .values
            .keys()
            .filter(|key| !next.values.contains_key(*key))
            .cloned()
            .collect();

        let mut updated = Vec::new();
        let mut added = Vec::new();
        for (key, value) in &next.values {
            match self.values.get(key) {
                Some(old) if old == value => {}
                Some(_) => updated.push((key.clone(), value.clone())),
                None => added.push((key.clone(), value.clone())),
            }
        }

        SnapshotDiff {
            removed,
            updated,
            added,
        }
    }
}

/// The difference between two consecutive snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Keys present before and absent now
    pub removed: Vec<String>,
    /// Keys present in both with a different value, with the new value
    pub updated: Vec<(String, String)>,
    /// Keys absent before and present now, with their value
    pub added: Vec<(String, String)>,
}

impl SnapshotDiff {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.updated.is_empty() && self.added.is_empty()
    }

    /// Total number of changed keys.
    pub fn len(&self) -> usize {
        self.removed.len() + self.updated.len() + self.added.len()
    }

    /// Flattens the diff into change events: removals, then updates, then
    /// additions.
    pub fn into_changes(self) -> Vec<PropertyChange> {
        let mut changes = Vec::with_capacity(self.len());
        changes.extend(self.removed.into_iter().map(PropertyChange::removed));
        changes.extend(
            self.updated
                .into_iter()
                .map(|(k, v)| PropertyChange::updated(k, v)),
        );
        changes.extend(self.added.into_iter().map(|(k, v)| PropertyChange::added(k, v)));
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeKind;

    fn snapshot(items: &[(&str, &str)]) -> Snapshot {
        Snapshot::new(
            items.iter().map(|(k, v)| (k.to_string(), v.to_string())),
            Vec::new(),
        )
    }

    #[test]
    fn test_first_poll_adds_everything() {
        let diff = Snapshot::default().diff(&snapshot(&[("b", "2"), ("a", "1")]));
        assert!(diff.removed.is_empty());
        assert!(diff.updated.is_empty());
        assert_eq!(
            diff.added,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_unchanged_keys_are_silent() {
        let old = snapshot(&[("a", "1")]);
        assert!(old.diff(&snapshot(&[("a", "1")])).is_empty());
    }

    #[test]
    fn test_id_only_change_is_not_an_update() {
        let old = Snapshot::new(
            vec![("a".to_string(), "1".to_string())],
            vec![("a".to_string(), "v1".to_string())],
        );
        let new = Snapshot::new(
            vec![("a".to_string(), "1".to_string())],
            vec![("a".to_string(), "v2".to_string())],
        );
        assert!(old.diff(&new).is_empty());
        assert_eq!(new.id("a"), Some("v2"));
    }

    #[test]
    fn test_ids_without_values_are_dropped() {
        let snap = Snapshot::new(
            vec![("a".to_string(), "1".to_string())],
            vec![("zzz".to_string(), "9".to_string())],
        );
        assert_eq!(snap.id("zzz"), None);
    }

    #[test]
    fn test_into_changes_order() {
        let old = snapshot(&[("a", "1"), ("b", "2")]);
        let new = snapshot(&[("b", "3"), ("c", "4")]);
        let kinds: Vec<_> = old
            .diff(&new)
            .into_changes()
            .iter()
            .map(|c| (c.kind(), c.key().to_string()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ChangeKind::Removed, "a".to_string()),
                (ChangeKind::Updated, "b".to_string()),
                (ChangeKind::Added, "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_change_response() {
        assert!(!PollingResponse::no_change().has_data());
        assert!(PollingResponse::for_snapshot(vec![], vec![]).has_data());
    }
}
