// SPDX-License-Identifier: MIT OR Apache-2.0

//! Copy-on-write listener registry.
//!
//! Registration and removal publish a new listener list through an
//! [`ArcSwap`]; dispatch iterates whatever list was current when it started.
//! A listener added while an event is being delivered therefore only sees
//! later events, and removal never corrupts an in-flight fan-out.

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Token returned by listener registration, used to deregister later.
///
/// Ids are unique across every registry in the process, so a token can never
/// remove a listener it was not issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

struct Entry<L: ?Sized> {
    id: ListenerId,
    listener: Arc<L>,
}

impl<L: ?Sized> Clone for Entry<L> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
        }
    }
}

/// A set of listeners of type `L` with snapshot dispatch.
pub struct ListenerRegistry<L: ?Sized> {
    entries: ArcSwap<Vec<Entry<L>>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Registers `listener` and returns its token.
    pub fn add(&self, listener: Arc<L>) -> ListenerId {
        let entry = Entry {
            id: ListenerId::next(),
            listener,
        };
        let id = entry.id;
        self.entries.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(entry.clone());
            next
        });
        id
    }

    /// Removes the listener registered under `id`.
    ///
    /// Returns `false` if no such listener is registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut removed = false;
        self.entries.rcu(|current| {
            removed = current.iter().any(|entry| entry.id == id);
            current
                .iter()
                .filter(|entry| entry.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        removed
    }

    /// Returns `true` if `id` is currently registered.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.load().iter().any(|entry| entry.id == id)
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Calls `f` with every listener registered at the time of the call.
    pub fn for_each(&self, mut f: impl FnMut(&L)) {
        let snapshot = self.entries.load_full();
        trace!(listeners = snapshot.len(), "dispatching event");
        for entry in snapshot.iter() {
            f(&*entry.listener);
        }
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ListenerId> = self.entries.load().iter().map(|e| e.id).collect();
        f.debug_struct("ListenerRegistry").field("ids", &ids).finish()
    }
}
