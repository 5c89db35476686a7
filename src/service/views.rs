// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped views over another config.
//!
//! A view shares its delegate's data but owns its decoder, interpolator and
//! listeners. [`PrefixedView`] narrows the key space to one prefix;
//! [`PrivateView`] keeps the key space and only isolates the view-local
//! state.
//!
//! Views subscribe to their delegate lazily, on the first
//! [`add_listener`](Config::add_listener). What the delegate holds is a small
//! forwarder pointing back at the view through a [`Weak`], and dropping the
//! view revokes that forwarder. Dropping the last `Arc` of a view therefore
//! releases the view, its subscription and its listeners together.

use crate::domain::{ConfigCore, ConfigError, ListenerId, PropertyChange};
use crate::ports::{Config, ConfigListener, Keys};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, Weak};

/// Creates views over any config held in an `Arc`.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
/// use std::sync::Arc;
///
/// let config = Arc::new(SettableConfig::new());
/// config.set_property("db.host", "localhost");
///
/// let db = config.prefixed_view("db");
/// assert_eq!(db.get_string("host").unwrap().as_deref(), Some("localhost"));
/// assert_eq!(db.keys().collect::<Vec<_>>(), vec!["host"]);
/// ```
pub trait ConfigViewExt {
    /// A view resolving `key` as `prefix.key` on this config.
    ///
    /// A trailing `.` on `prefix` is optional.
    fn prefixed_view(&self, prefix: &str) -> Arc<PrefixedView>;

    /// A view with the same keys and its own decoder, interpolator and
    /// listeners.
    fn private_view(&self) -> Arc<PrivateView>;

    /// Alias for [`prefixed_view`](ConfigViewExt::prefixed_view).
    fn subset(&self, prefix: &str) -> Arc<PrefixedView> {
        self.prefixed_view(prefix)
    }
}

impl<C: Config + ?Sized> ConfigViewExt for Arc<C> {
    fn prefixed_view(&self, prefix: &str) -> Arc<PrefixedView> {
        PrefixedView::new(Arc::clone(self).into_config(), prefix)
    }

    fn private_view(&self) -> Arc<PrivateView> {
        PrivateView::new(Arc::clone(self).into_config())
    }
}

/// Normalizes a view prefix to end in exactly one `.`; an empty prefix (or
/// one made only of dots) stays empty.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}.", trimmed)
    }
}

/// Delegate-side half of a view subscription.
struct ViewForwarder<V> {
    view: Weak<V>,
}

/// What a view does with its delegate's events.
trait ForwardingView: Config + Sized {
    /// Translates a delegate change into a view-local one, or drops it.
    fn translate(&self, change: &PropertyChange) -> Option<PropertyChange>;
}

impl<V: ForwardingView> ConfigListener for ViewForwarder<V> {
    fn on_config_added(&self, _delegate: &dyn Config) {
        if let Some(view) = self.view.upgrade() {
            view.core().fire_config_added(&*view);
        }
    }

    fn on_config_removed(&self, _delegate: &dyn Config) {
        if let Some(view) = self.view.upgrade() {
            view.core().fire_config_removed(&*view);
        }
    }

    fn on_config_updated(&self, _delegate: &dyn Config, change: &PropertyChange) {
        if let Some(view) = self.view.upgrade() {
            if let Some(local) = view.translate(change) {
                view.core().fire_config_updated(&*view, &local);
            }
        }
    }

    fn on_error(&self, error: &ConfigError, _delegate: &dyn Config) {
        if let Some(view) = self.view.upgrade() {
            view.core().fire_error(error, &*view);
        }
    }
}

/// Lazily established, revocable subscription to a delegate.
struct DelegateSubscription {
    delegate: Arc<dyn Config>,
    token: OnceCell<ListenerId>,
}

impl DelegateSubscription {
    fn new(delegate: Arc<dyn Config>) -> Self {
        Self {
            delegate,
            token: OnceCell::new(),
        }
    }

    fn ensure<V: ForwardingView + 'static>(&self, view: &Weak<V>) {
        self.token.get_or_init(|| {
            self.delegate
                .add_listener(Arc::new(ViewForwarder { view: view.clone() }))
        });
    }

    fn is_active(&self) -> bool {
        self.token.get().is_some()
    }
}

impl Drop for DelegateSubscription {
    fn drop(&mut self) {
        if let Some(token) = self.token.get() {
            self.delegate.remove_listener(*token);
        }
    }
}

/// A view translating local keys to `prefix + key` on its delegate.
///
/// Only changes to keys under the prefix reach the view's listeners, with the
/// prefix stripped. Structural and error events pass through unchanged.
///
/// References inside values are resolved against the delegate's full key
/// space, so `${other.key}` in a value under the prefix still finds keys
/// outside it.
pub struct PrefixedView {
    core: ConfigCore,
    prefix: String,
    subscription: DelegateSubscription,
    self_ref: Weak<PrefixedView>,
}

impl PrefixedView {
    /// Creates a view of `delegate` under `prefix`.
    pub fn new(delegate: Arc<dyn Config>, prefix: &str) -> Arc<Self> {
        let prefix = normalize_prefix(prefix);
        let name = format!("{}:{}", delegate.name(), prefix);
        let core = ConfigCore::derived_from(name, delegate.core());
        Arc::new_cyclic(|self_ref| Self {
            core,
            prefix,
            subscription: DelegateSubscription::new(delegate),
            self_ref: self_ref.clone(),
        })
    }

    /// The normalized prefix, ending in `.` unless empty.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The config this view reads from.
    pub fn delegate(&self) -> &Arc<dyn Config> {
        &self.subscription.delegate
    }

    /// Returns `true` once the view has subscribed to its delegate.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn local_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())
    }
}

impl ForwardingView for PrefixedView {
    fn translate(&self, change: &PropertyChange) -> Option<PropertyChange> {
        self.local_key(change.key())
            .map(|local| change.with_key(local))
    }
}

impl Config for PrefixedView {
    fn core(&self) -> &ConfigCore {
        &self.core
    }

    fn get_raw_property(&self, key: &str) -> Option<String> {
        self.delegate().get_raw_property(&self.full_key(key))
    }

    fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String> {
        self.delegate()
            .get_raw_property_uninstrumented(&self.full_key(key))
    }

    fn keys(&self) -> Keys {
        self.delegate()
            .keys()
            .filter_map(|key| self.local_key(&key).map(str::to_string))
            .collect()
    }

    fn for_each_property(&self, f: &mut dyn FnMut(&str, &str)) {
        let delegate = self.delegate();
        for key in delegate.keys() {
            let Some(local) = self.local_key(&key) else {
                continue;
            };
            if let Some(value) = delegate.get_raw_property(&key) {
                f(local, &value);
            }
        }
    }

    fn for_each_property_uninstrumented(&self, f: &mut dyn FnMut(&str, &str)) {
        self.delegate()
            .for_each_property_uninstrumented(&mut |key, value| {
                if let Some(local) = self.local_key(key) {
                    f(local, value);
                }
            });
    }

    fn instrumentation_enabled(&self) -> bool {
        self.delegate().instrumentation_enabled()
    }

    fn resolve_reference(&self, key: &str) -> Option<String> {
        self.delegate().resolve_reference(key)
    }

    fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId {
        self.subscription.ensure(&self.self_ref);
        self.core.add_listener(listener)
    }
}

impl fmt::Debug for PrefixedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixedView")
            .field("delegate", &self.delegate().name())
            .field("prefix", &self.prefix)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

/// A view with the delegate's keys and its own decoder, interpolator and
/// listeners.
///
/// The decoder and interpolator start out as the delegate's; replacing
/// either on one side never affects the other.
pub struct PrivateView {
    core: ConfigCore,
    subscription: DelegateSubscription,
    self_ref: Weak<PrivateView>,
}

impl PrivateView {
    /// Creates a private view of `delegate`.
    pub fn new(delegate: Arc<dyn Config>) -> Arc<Self> {
        let core = ConfigCore::derived_from(delegate.name().to_string(), delegate.core());
        Arc::new_cyclic(|self_ref| Self {
            core,
            subscription: DelegateSubscription::new(delegate),
            self_ref: self_ref.clone(),
        })
    }

    /// The config this view reads from.
    pub fn delegate(&self) -> &Arc<dyn Config> {
        &self.subscription.delegate
    }

    /// Returns `true` once the view has subscribed to its delegate.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }
}

impl ForwardingView for PrivateView {
    fn translate(&self, change: &PropertyChange) -> Option<PropertyChange> {
        Some(change.clone())
    }
}

impl Config for PrivateView {
    fn core(&self) -> &ConfigCore {
        &self.core
    }

    fn get_raw_property(&self, key: &str) -> Option<String> {
        self.delegate().get_raw_property(key)
    }

    fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String> {
        self.delegate().get_raw_property_uninstrumented(key)
    }

    fn keys(&self) -> Keys {
        self.delegate().keys()
    }

    fn for_each_property(&self, f: &mut dyn FnMut(&str, &str)) {
        self.delegate().for_each_property(f)
    }

    fn for_each_property_uninstrumented(&self, f: &mut dyn FnMut(&str, &str)) {
        self.delegate().for_each_property_uninstrumented(f)
    }

    fn instrumentation_enabled(&self) -> bool {
        self.delegate().instrumentation_enabled()
    }

    fn resolve_reference(&self, key: &str) -> Option<String> {
        self.delegate().resolve_reference(key)
    }

    fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId {
        self.subscription.ensure(&self.self_ref);
        self.core.add_listener(listener)
    }
}

impl fmt::Debug for PrivateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateView")
            .field("delegate", &self.delegate().name())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SettableConfig;
    use crate::ports::ConfigExt;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("foo"), "foo.");
        assert_eq!(normalize_prefix("foo."), "foo.");
        assert_eq!(normalize_prefix("foo.."), "foo.");
        assert_eq!(normalize_prefix("a.b"), "a.b.");
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("."), "");
    }

    #[test]
    fn test_subscription_is_lazy() {
        let config = Arc::new(SettableConfig::new());
        let view = config.prefixed_view("foo");
        assert!(!view.is_subscribed());
        assert_eq!(config.listener_count(), 0);

        view.add_listener(Arc::new(NoopListener));
        view.add_listener(Arc::new(NoopListener));
        assert!(view.is_subscribed());
        assert_eq!(config.listener_count(), 1);
    }

    #[test]
    fn test_drop_revokes_subscription() {
        let config = Arc::new(SettableConfig::new());
        let view = config.private_view();
        view.add_listener(Arc::new(NoopListener));
        assert_eq!(config.listener_count(), 1);
        drop(view);
        assert_eq!(config.listener_count(), 0);
    }

    #[test]
    fn test_nested_prefixes() {
        let config = Arc::new(SettableConfig::new());
        config.set_property("a.b.c", "deep");
        let outer = config.prefixed_view("a");
        let inner = outer.prefixed_view("b");
        assert_eq!(inner.get_raw_property("c").as_deref(), Some("deep"));
        assert_eq!(inner.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_empty_prefix_is_identity() {
        let config = Arc::new(SettableConfig::new());
        config.set_property("x", "1");
        let view = config.prefixed_view("");
        assert_eq!(view.get_raw_property("x").as_deref(), Some("1"));
    }

    #[test]
    fn test_prefixed_interpolation_sees_full_key_space() {
        let config = Arc::new(SettableConfig::new());
        config.set_property("host", "example.org");
        config.set_property("svc.url", "https://${host}");
        let view = config.subset("svc");
        assert_eq!(
            view.get_string("url").unwrap().as_deref(),
            Some("https://example.org")
        );
    }

    struct NoopListener;

    impl ConfigListener for NoopListener {}
}
