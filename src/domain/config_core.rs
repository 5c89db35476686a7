// SPDX-License-Identifier: MIT OR Apache-2.0

//! State shared by every config implementation.
//!
//! Each config owns one [`ConfigCore`] holding its name, its decoder and
//! interpolator, the non-owning parent link, the missing-key policy and the
//! listener registry. The provided methods of [`Config`] work against it, so
//! an implementation only has to supply lookups and key enumeration.

use super::listeners::{ListenerId, ListenerRegistry};
use super::{ConfigError, PropertyChange};
use crate::adapters::{DefaultDecoder, DefaultInterpolator};
use crate::ports::{Config, ConfigListener, Decoder, Interpolator};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Name, collaborators, parent link and listeners of one config.
pub struct ConfigCore {
    name: String,
    decoder: RwLock<Arc<dyn Decoder>>,
    interpolator: RwLock<Arc<dyn Interpolator>>,
    parent: RwLock<Option<Weak<dyn Config>>>,
    fail_on_missing: AtomicBool,
    listeners: ListenerRegistry<dyn ConfigListener>,
}

impl ConfigCore {
    /// Creates a core with a fresh [`DefaultDecoder`] and
    /// [`DefaultInterpolator`].
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_collaborators(
            name,
            Arc::new(DefaultDecoder::new()),
            Arc::new(DefaultInterpolator::new()),
        )
    }

    /// Creates a core with the given decoder and interpolator.
    pub fn with_collaborators(
        name: impl Into<String>,
        decoder: Arc<dyn Decoder>,
        interpolator: Arc<dyn Interpolator>,
    ) -> Self {
        Self {
            name: name.into(),
            decoder: RwLock::new(decoder),
            interpolator: RwLock::new(interpolator),
            parent: RwLock::new(None),
            fail_on_missing: AtomicBool::new(false),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Creates a core that starts out with `other`'s decoder, interpolator
    /// and missing-key policy. Later changes on either side stay local.
    pub fn derived_from(name: impl Into<String>, other: &ConfigCore) -> Self {
        let core = Self::with_collaborators(name, other.decoder(), other.interpolator());
        core.set_fail_on_missing(other.fail_on_missing());
        core
    }

    /// The config's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current decoder.
    pub fn decoder(&self) -> Arc<dyn Decoder> {
        Arc::clone(&*self.decoder.read())
    }

    /// Replaces the decoder.
    pub fn set_decoder(&self, decoder: Arc<dyn Decoder>) {
        *self.decoder.write() = decoder;
    }

    /// The current interpolator.
    pub fn interpolator(&self) -> Arc<dyn Interpolator> {
        Arc::clone(&*self.interpolator.read())
    }

    /// Replaces the interpolator.
    pub fn set_interpolator(&self, interpolator: Arc<dyn Interpolator>) {
        *self.interpolator.write() = interpolator;
    }

    /// The parent, if one was set and is still alive.
    pub fn parent(&self) -> Option<Arc<dyn Config>> {
        self.parent.read().as_ref().and_then(Weak::upgrade)
    }

    /// Links `parent` without taking ownership of it.
    pub fn set_parent(&self, parent: &Arc<dyn Config>) {
        *self.parent.write() = Some(Arc::downgrade(parent));
    }

    /// Removes the parent link.
    pub fn clear_parent(&self) {
        *self.parent.write() = None;
    }

    /// Whether no-default accessors fail on absent keys.
    pub fn fail_on_missing(&self) -> bool {
        self.fail_on_missing.load(Ordering::Acquire)
    }

    /// Sets the missing-key policy.
    pub fn set_fail_on_missing(&self, fail: bool) {
        self.fail_on_missing.store(fail, Ordering::Release);
    }

    /// The listener registry.
    pub fn listeners(&self) -> &ListenerRegistry<dyn ConfigListener> {
        &self.listeners
    }

    /// Registers `listener` directly on this core.
    pub fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Removes a listener registered on this core.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Delivers a structural "added" event with `config` as the source.
    pub fn fire_config_added(&self, config: &dyn Config) {
        self.listeners.for_each(|l| l.on_config_added(config));
    }

    /// Delivers a structural "removed" event with `config` as the source.
    pub fn fire_config_removed(&self, config: &dyn Config) {
        self.listeners.for_each(|l| l.on_config_removed(config));
    }

    /// Delivers a value change with `config` as the source.
    pub fn fire_config_updated(&self, config: &dyn Config, change: &PropertyChange) {
        self.listeners.for_each(|l| l.on_config_updated(config, change));
    }

    /// Delivers an error with `config` as the source.
    pub fn fire_error(&self, error: &ConfigError, config: &dyn Config) {
        self.listeners.for_each(|l| l.on_error(error, config));
    }
}

impl fmt::Debug for ConfigCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigCore")
            .field("name", &self.name)
            .field("fail_on_missing", &self.fail_on_missing())
            .field("listeners", &self.listeners.len())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}
