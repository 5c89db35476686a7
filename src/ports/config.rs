// SPDX-License-Identifier: MIT OR Apache-2.0

//! The config capability and its typed access surface.
//!
//! [`Config`] is the one interface every config in this crate implements:
//! leaves, polling sources, composites and views. It is object-safe, so
//! configs are composed as `Arc<dyn Config>`. An implementation supplies raw
//! lookups, key enumeration and its [`ConfigCore`]; decoder, interpolator,
//! parent and listener handling come from provided methods.
//!
//! Typed access lives on the [`ConfigExt`] extension trait, which is
//! implemented for every config including `dyn Config`.

use crate::domain::{ConfigCore, ConfigError, ListenerId, Result};
use crate::ports::{ConfigListener, Decoder, Interpolator};
use std::any::Any;
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::debug;

/// How far [`Config::resolve_reference`] follows parent links.
const MAX_PARENT_DEPTH: usize = 32;

/// Converts an `Arc` of any config into an `Arc<dyn Config>`.
///
/// Implemented for every sized config, and available on `dyn Config` through
/// the vtable, so generic code can turn `Arc<C>` into a trait object whether or
/// not `C` is already one.
pub trait IntoConfigArc {
    /// Performs the conversion.
    fn into_config(self: Arc<Self>) -> Arc<dyn Config>;
}

impl<T: Config + 'static> IntoConfigArc for T {
    fn into_config(self: Arc<Self>) -> Arc<dyn Config> {
        self
    }
}

/// A named, observable source of raw string properties.
pub trait Config: IntoConfigArc + Send + Sync {
    /// The state shared by all configs.
    fn core(&self) -> &ConfigCore;

    /// Looks `key` up without recording the access.
    fn get_raw_property_uninstrumented(&self, key: &str) -> Option<String>;

    /// Snapshot of the keys currently visible, in this config's order.
    fn keys(&self) -> Keys;

    /// The config's name.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Looks `key` up, recording the access when instrumentation is enabled.
    fn get_raw_property(&self, key: &str) -> Option<String> {
        self.get_raw_property_uninstrumented(key)
    }

    /// Calls `f` with every visible key and its raw value, recording each
    /// access when instrumentation is enabled.
    fn for_each_property(&self, f: &mut dyn FnMut(&str, &str)) {
        self.for_each_property_uninstrumented(f)
    }

    /// Calls `f` with every visible key and its raw value without recording.
    fn for_each_property_uninstrumented(&self, f: &mut dyn FnMut(&str, &str)) {
        for key in self.keys() {
            if let Some(value) = self.get_raw_property_uninstrumented(&key) {
                f(&key, &value);
            }
        }
    }

    /// Whether reads through this config are recorded.
    fn instrumentation_enabled(&self) -> bool {
        false
    }

    /// Resolves a `${key}` reference found while interpolating a value of
    /// this config: the key itself first, then the parent chain.
    fn resolve_reference(&self, key: &str) -> Option<String> {
        if let Some(value) = self.get_raw_property_uninstrumented(key) {
            return Some(value);
        }
        let mut next = self.parent();
        for _ in 0..MAX_PARENT_DEPTH {
            let parent = next?;
            if let Some(value) = parent.get_raw_property_uninstrumented(key) {
                return Some(value);
            }
            next = parent.parent();
        }
        None
    }

    /// Returns `true` if `key` has a value.
    fn contains_key(&self, key: &str) -> bool {
        self.get_raw_property_uninstrumented(key).is_some()
    }

    /// Returns `true` if no key is visible.
    fn is_empty(&self) -> bool {
        self.keys().len() == 0
    }

    /// The current decoder.
    fn decoder(&self) -> Arc<dyn Decoder> {
        self.core().decoder()
    }

    /// Replaces the decoder used by this config only.
    fn set_decoder(&self, decoder: Arc<dyn Decoder>) {
        self.core().set_decoder(decoder)
    }

    /// The current interpolator.
    fn interpolator(&self) -> Arc<dyn Interpolator> {
        self.core().interpolator()
    }

    /// Replaces the interpolator used by this config only.
    fn set_interpolator(&self, interpolator: Arc<dyn Interpolator>) {
        self.core().set_interpolator(interpolator)
    }

    /// Registers a listener and returns the token to remove it with.
    fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId {
        self.core().add_listener(listener)
    }

    /// Removes a listener. Returns `false` if `id` was not registered here.
    fn remove_listener(&self, id: ListenerId) -> bool {
        self.core().remove_listener(id)
    }

    /// Number of listeners registered on this config.
    fn listener_count(&self) -> usize {
        self.core().listeners().len()
    }

    /// The parent config, if one is set and still alive.
    fn parent(&self) -> Option<Arc<dyn Config>> {
        self.core().parent()
    }

    /// Links a parent used for fallback and interpolation. The parent is not
    /// kept alive by this link.
    fn set_parent(&self, parent: &Arc<dyn Config>) {
        self.core().set_parent(parent)
    }

    /// Whether no-default accessors fail with [`ConfigError::MissingKey`].
    fn fail_on_missing(&self) -> bool {
        self.core().fail_on_missing()
    }

    /// Sets the missing-key policy for the no-default accessors.
    fn set_fail_on_missing(&self, fail: bool) {
        self.core().set_fail_on_missing(fail)
    }
}

/// Read-only snapshot of a config's keys.
///
/// The snapshot is taken when [`Config::keys`] is called; later changes to
/// the config do not affect an iterator already handed out.
#[derive(Clone, Debug, Default)]
pub struct Keys {
    inner: std::vec::IntoIter<String>,
}

impl Keys {
    /// An empty key set.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl From<Vec<String>> for Keys {
    fn from(keys: Vec<String>) -> Self {
        Self {
            inner: keys.into_iter(),
        }
    }
}

impl FromIterator<String> for Keys {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Iterator for Keys {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Keys {}

impl FusedIterator for Keys {}

macro_rules! typed_getters {
    ($($(#[$doc:meta])* $get:ident, $get_or:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            fn $get(&self, key: &str) -> Result<Option<$ty>> {
                self.get::<$ty>(key)
            }

            #[doc = concat!("Like [`", stringify!($get), "`](ConfigExt::", stringify!($get), "), returning `default` on any failure.")]
            fn $get_or(&self, key: &str, default: $ty) -> $ty {
                self.get_or::<$ty>(key, default)
            }
        )*
    };
}

/// Typed accessors available on every config.
///
/// The no-default accessors return `Ok(None)` for an absent key, or
/// [`ConfigError::MissingKey`] when the config fails on missing keys. A value
/// that is present but does not decode yields `Ok(None)` regardless of that
/// policy. The `_or` accessors never fail.
///
/// Values are interpolated before they are decoded.
///
/// # Examples
///
/// ```rust
/// use livecfg::prelude::*;
///
/// let config = SettableConfig::new();
/// config.set_property("port", "8080");
/// config.set_property("url", "http://localhost:${port}");
///
/// assert_eq!(config.get_integer("port").unwrap(), Some(8080));
/// assert_eq!(config.get_integer_or("missing", 1), 1);
/// assert_eq!(
///     config.get_string("url").unwrap().as_deref(),
///     Some("http://localhost:8080")
/// );
/// ```
pub trait ConfigExt: Config {
    /// Returns the raw value of `key` with references resolved.
    ///
    /// Absent keys yield `Ok(None)` whatever the missing-key policy.
    fn interpolate(&self, key: &str) -> Result<Option<String>> {
        let Some(raw) = self.get_raw_property(key) else {
            return Ok(None);
        };
        let lookup = |name: &str| self.resolve_reference(name);
        self.interpolator().resolve(key, &raw, &lookup).map(Some)
    }

    /// Returns the interpolated string value of `key`.
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.interpolate(key)? {
            Some(value) => Ok(Some(value)),
            None if self.fail_on_missing() => Err(ConfigError::MissingKey {
                key: key.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Like [`get_string`](ConfigExt::get_string), returning `default` on any
    /// failure.
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_or::<String>(key, default.to_string())
    }

    /// Decodes `key` into any type the decoder supports.
    fn get<T: Any>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.get_string(key)? else {
            return Ok(None);
        };
        match self.decoder().decode::<T>(&value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(source) => {
                debug!(
                    config = self.name(),
                    key,
                    error = %ConfigError::conversion(key, source),
                    "Ignoring value that failed to decode"
                );
                Ok(None)
            }
        }
    }

    /// Like [`get`](ConfigExt::get), returning `default` on any failure.
    fn get_or<T: Any>(&self, key: &str, default: T) -> T {
        match self.get::<T>(key) {
            Ok(Some(value)) => value,
            Ok(None) | Err(ConfigError::MissingKey { .. }) => default,
            Err(error) => {
                debug!(config = self.name(), key, %error, "Falling back to default");
                default
            }
        }
    }

    typed_getters! {
        /// Returns `key` as an `i32`.
        get_integer, get_integer_or => i32;
        /// Returns `key` as an `i64`.
        get_long, get_long_or => i64;
        /// Returns `key` as an `f64`.
        get_double, get_double_or => f64;
        /// Returns `key` as an `f32`.
        get_float, get_float_or => f32;
        /// Returns `key` as an `i16`.
        get_short, get_short_or => i16;
        /// Returns `key` as an `i8`.
        get_byte, get_byte_or => i8;
        /// Returns `key` as a `bool`. Accepts `true`/`yes`/`on` and
        /// `false`/`no`/`off`, ignoring case.
        get_boolean, get_boolean_or => bool;
        /// Returns `key` as an arbitrary-width integer.
        get_big_integer, get_big_integer_or => i128;
        /// Returns `key` as a decimal.
        get_big_decimal, get_big_decimal_or => f64;
        /// Returns `key` split on `,`. Trailing empty items are dropped.
        get_list, get_list_or => Vec<String>;
    }

    /// Keys starting with `prefix`, in this config's order.
    fn keys_with_prefix(&self, prefix: &str) -> Keys {
        self.keys().filter(|key| key.starts_with(prefix)).collect()
    }

    /// Calls `visitor` with every key and its interpolated value.
    ///
    /// Keys whose value cannot be interpolated are skipped.
    fn accept(&self, mut visitor: impl FnMut(&str, &str)) {
        for key in self.keys() {
            match self.interpolate(&key) {
                Ok(Some(value)) => visitor(&key, &value),
                Ok(None) => {}
                Err(error) => debug!(config = self.name(), key = %key, %error, "Skipping key"),
            }
        }
    }
}

impl<C: Config + ?Sized> ConfigExt for C {}
