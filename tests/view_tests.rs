// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for prefixed and private views.

mod common;

use common::{FixedIntDecoder, RecordingListener};
use livecfg::adapters::DefaultDecoder;
use livecfg::domain::{ChangeKind, PropertyDetails};
use livecfg::ports::Decoder;
use livecfg::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn map(items: &[(&str, &str)]) -> Arc<MapConfig> {
    Arc::new(
        MapConfig::builder()
            .put_all(items.iter().map(|(k, v)| (k.to_string(), v.to_string())))
            .build(),
    )
}

fn composite_of(name: &str, config: Arc<dyn Config>) -> Arc<CompositeConfig> {
    CompositeConfig::builder()
        .with_config(name, config)
        .unwrap()
        .build()
        .unwrap()
}

fn instrumented_source() -> (Arc<UsageTracker>, Arc<PollingConfig>) {
    let tracker = Arc::new(UsageTracker::new());
    let strategy = Arc::new(ManualPollingStrategy::new());
    let config = PollingConfig::builder(
        || {
            Ok(PollingResponse::for_snapshot(
                vec![
                    ("foo.prop1".to_string(), "foo-value".to_string()),
                    ("foo.prop2".to_string(), "bar-value".to_string()),
                ],
                vec![
                    ("foo.prop1".to_string(), "1".to_string()),
                    ("foo.prop2".to_string(), "2".to_string()),
                ],
            ))
        },
        strategy.clone(),
    )
    .access_monitor(tracker.clone())
    .build()
    .unwrap();
    strategy.fire().unwrap();
    (tracker, config)
}

fn prop1() -> PropertyDetails {
    PropertyDetails::new("foo.prop1", Some("1".to_string()), "foo-value")
}

fn prop2() -> PropertyDetails {
    PropertyDetails::new("foo.prop2", Some("2".to_string()), "bar-value")
}

#[test]
fn test_prefixed_view_notified_on_child_added() {
    let config = composite_of("foo", map(&[("foo.bar", "value")]));
    let prefix = config.prefixed_view("foo");
    let listener = RecordingListener::new();
    prefix.add_listener(listener.clone());
    assert_eq!(listener.added(), 0);

    config
        .add_config("bar", composite_of("foo", map(&[("foo.bar", "value")])))
        .unwrap();
    assert_eq!(listener.added(), 1);
}

#[test]
fn test_prefixed_view_notified_on_settable_change() {
    let settable = Arc::new(SettableConfig::new());
    settable.set_property("foo.bar", "original");
    let config = composite_of("settable", settable.clone());

    let prefix = config.prefixed_view("foo");
    let listener = RecordingListener::new();
    prefix.add_listener(listener.clone());
    assert_eq!(prefix.get_string("bar").unwrap().as_deref(), Some("original"));

    settable.set_property("foo.bar", "new");
    let updates = listener.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].key(), "bar");
    assert_eq!(updates[0].kind(), ChangeKind::Updated);
    assert_eq!(prefix.get_string("bar").unwrap().as_deref(), Some("new"));

    config
        .add_config("new", map(&[("foo.bar", "new2")]))
        .unwrap();
    assert_eq!(listener.added(), 1);
    assert_eq!(listener.updates().len(), 1);
}

#[test]
fn test_prefixed_view_ignores_keys_outside_prefix() {
    let settable = Arc::new(SettableConfig::new());
    let prefix = settable.prefixed_view("foo");
    let listener = RecordingListener::new();
    prefix.add_listener(listener.clone());

    settable.set_property("other.bar", "x");
    settable.set_property("foobar", "x");
    assert!(listener.updates().is_empty());
}

#[test]
fn test_trailing_dot_allowed() {
    let settable = Arc::new(SettableConfig::new());
    settable.set_property("foo.bar", "value");

    let no_dot = settable.prefixed_view("foo");
    let with_dot = settable.prefixed_view("foo.");
    assert_eq!(no_dot.get_string("bar").unwrap().as_deref(), Some("value"));
    assert_eq!(with_dot.get_string("bar").unwrap().as_deref(), Some("value"));
}

#[test]
fn test_unused_prefixed_view_is_released() {
    let source = Arc::new(SettableConfig::new());
    let before = source.listener_count();

    let prefix = source.prefixed_view("foo.");
    prefix.add_listener(RecordingListener::new());
    assert_eq!(source.listener_count(), before + 1);

    let weak = Arc::downgrade(&prefix);
    drop(prefix);
    assert!(weak.upgrade().is_none());
    assert_eq!(source.listener_count(), before);
}

#[test]
fn test_prefixed_keys() {
    let config = map(&[("foo.prop1", "value1"), ("foo.prop2", "value2"), ("bar", "x")])
        .prefixed_view("foo");
    let keys: HashSet<String> = config.keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("prop1"));
    assert!(keys.contains("prop2"));
}

#[test]
fn test_prefixed_instrumentation_not_enabled() {
    let config = map(&[("foo.prop1", "value1"), ("foo.prop2", "value2")]).prefixed_view("foo");
    assert!(!config.instrumentation_enabled());
    assert_eq!(config.get_raw_property("prop1").as_deref(), Some("value1"));
    assert_eq!(config.get_raw_property("prop2").as_deref(), Some("value2"));
}

#[test]
fn test_prefixed_instrumentation() {
    let (tracker, base) = instrumented_source();
    let config = base.prefixed_view("foo");
    assert!(config.instrumentation_enabled());

    config.get_raw_property("prop1");
    assert_eq!(tracker.count(&prop1()), 1);
    assert_eq!(tracker.total(), 1);

    config.get_raw_property_uninstrumented("prop2");
    assert_eq!(tracker.total(), 1);

    config.for_each_property(&mut |_, _| {});
    assert_eq!(tracker.count(&prop1()), 2);
    assert_eq!(tracker.count(&prop2()), 1);
    assert_eq!(tracker.total(), 3);

    config.for_each_property_uninstrumented(&mut |_, _| {});
    assert_eq!(tracker.total(), 3);
}

#[test]
fn test_private_decoder_does_not_propagate() {
    let config = composite_of("foo", map(&[("foo.bar", "value")]));
    let private = config.private_view();

    let private_decoder: Arc<dyn Decoder> = Arc::new(FixedIntDecoder(42));
    private.set_decoder(private_decoder.clone());
    assert!(!Arc::ptr_eq(&config.decoder(), &private.decoder()));

    let upstream: Arc<dyn Decoder> = Arc::new(DefaultDecoder::new());
    config.set_decoder(upstream);
    assert!(!Arc::ptr_eq(&config.decoder(), &private.decoder()));
    assert!(Arc::ptr_eq(&private_decoder, &private.decoder()));

    assert_eq!(private.get_integer("foo.bar").unwrap(), Some(42));
    assert_eq!(config.get_integer("foo.bar").unwrap(), None);
}

#[test]
fn test_private_view_notified_on_child_added() {
    let config = composite_of("foo", map(&[("foo.bar", "value")]));
    let private = config.private_view();
    let listener = RecordingListener::new();
    private.add_listener(listener.clone());
    assert_eq!(listener.added(), 0);

    config
        .add_config("bar", composite_of("foo", map(&[("foo.bar", "value")])))
        .unwrap();
    assert_eq!(listener.added(), 1);
}

#[test]
fn test_private_view_notified_on_settable_change() {
    let settable = Arc::new(SettableConfig::new());
    settable.set_property("foo.bar", "original");
    let config = composite_of("settable", settable.clone());

    let private = config.private_view();
    let listener = RecordingListener::new();
    private.add_listener(listener.clone());
    assert_eq!(
        private.get_string("foo.bar").unwrap().as_deref(),
        Some("original")
    );

    settable.set_property("foo.bar", "new");
    assert_eq!(listener.updates().len(), 1);
    assert_eq!(private.get_string("foo.bar").unwrap().as_deref(), Some("new"));

    config
        .add_config("new", map(&[("foo.bar", "new2")]))
        .unwrap();
    assert_eq!(listener.added(), 1);
    assert_eq!(listener.updates().len(), 1);
}

#[test]
fn test_unused_private_view_is_released() {
    let source = Arc::new(SettableConfig::new());
    let private = source.private_view();
    private.add_listener(RecordingListener::new());
    assert_eq!(source.listener_count(), 1);

    let weak = Arc::downgrade(&private);
    drop(private);
    assert!(weak.upgrade().is_none());
    assert_eq!(source.listener_count(), 0);
}

#[test]
fn test_private_keys() {
    let config = map(&[("foo", "foo-value"), ("bar", "bar-value")]).private_view();
    let keys: HashSet<String> = config.keys().collect();
    assert_eq!(keys, HashSet::from(["foo".to_string(), "bar".to_string()]));
}

#[test]
fn test_private_instrumentation() {
    let (tracker, base) = instrumented_source();
    let config = base.private_view();
    assert!(config.instrumentation_enabled());

    config.get_raw_property("foo.prop1");
    assert_eq!(tracker.count(&prop1()), 1);
    assert_eq!(tracker.total(), 1);

    config.get_raw_property_uninstrumented("foo.prop2");
    assert_eq!(tracker.total(), 1);

    config.for_each_property(&mut |_, _| {});
    assert_eq!(tracker.count(&prop1()), 2);
    assert_eq!(tracker.count(&prop2()), 1);
    assert_eq!(tracker.total(), 3);

    config.for_each_property_uninstrumented(&mut |_, _| {});
    assert_eq!(tracker.total(), 3);
}
