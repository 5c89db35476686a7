// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for polled configs and their strategies.

mod common;

use common::RecordingListener;
use livecfg::adapters::PollState;
use livecfg::domain::{BoxError, PropertyChange};
use livecfg::prelude::*;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type Fetch = std::result::Result<PollingResponse, BoxError>;
type Script = Arc<Mutex<VecDeque<Fetch>>>;

fn snapshot(items: &[(&str, &str)]) -> PollingResponse {
    PollingResponse::for_snapshot(
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>(),
        Vec::new(),
    )
}

fn scripted(
    responses: Vec<Fetch>,
) -> (Arc<ManualPollingStrategy>, Arc<PollingConfig>) {
    let script: Script = Arc::new(Mutex::new(responses.into()));
    let strategy = Arc::new(ManualPollingStrategy::new());
    let config = PollingConfig::builder(
        move || {
            script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(PollingResponse::no_change()))
        },
        strategy.clone(),
    )
    .name("remote")
    .build()
    .unwrap();
    (strategy, config)
}

#[test]
fn test_snapshot_diff_events() {
    let (strategy, config) = scripted(vec![
        Ok(snapshot(&[("a", "1"), ("b", "2")])),
        Ok(snapshot(&[("b", "3"), ("c", "4")])),
    ]);
    strategy.fire().unwrap();

    let listener = RecordingListener::new();
    config.add_listener(listener.clone());
    strategy.fire().unwrap();

    assert_eq!(
        listener.updates(),
        vec![
            PropertyChange::removed("a"),
            PropertyChange::updated("b", "3"),
            PropertyChange::added("c", "4"),
        ]
    );
    assert_eq!(config.get_string("a").unwrap(), None);
    assert_eq!(config.get_integer("c").unwrap(), Some(4));
}

#[test]
fn test_unchanged_snapshot_is_silent() {
    let (strategy, config) = scripted(vec![
        Ok(snapshot(&[("a", "1")])),
        Ok(snapshot(&[("a", "1")])),
        Ok(PollingResponse::no_change()),
    ]);
    strategy.fire().unwrap();
    let listener = RecordingListener::new();
    config.add_listener(listener.clone());

    strategy.fire().unwrap();
    strategy.fire().unwrap();
    assert!(listener.events().is_empty());
    assert_eq!(config.get_string("a").unwrap().as_deref(), Some("1"));
    assert_eq!(config.poll_count(), 3);
}

#[test]
fn test_fetch_failure_keeps_snapshot_and_notifies() {
    let (strategy, config) = scripted(vec![
        Ok(snapshot(&[("a", "1")])),
        Err("backend unavailable".into()),
    ]);
    strategy.fire().unwrap();
    let listener = RecordingListener::new();
    config.add_listener(listener.clone());

    let result = strategy.fire();
    assert!(matches!(result, Err(ConfigError::FetchError { .. })));
    assert_eq!(listener.errors(), 1);
    assert_eq!(config.error_count(), 1);
    assert_eq!(config.get_string("a").unwrap().as_deref(), Some("1"));
    assert_eq!(config.poll_state(), PollState::Idle);
}

#[test]
fn test_property_handle_over_polled_source() {
    let (strategy, config) = scripted(vec![
        Ok(snapshot(&[("limit", "5")])),
        Ok(snapshot(&[("limit", "7")])),
    ]);
    let factory = PropertyFactory::new(config.clone());
    let limit = factory.get_property("limit").as_integer(0);
    assert_eq!(limit.get(), 0);

    strategy.fire().unwrap();
    assert_eq!(limit.get(), 5);
    strategy.fire().unwrap();
    assert_eq!(limit.get(), 7);
    assert!(config.last_updated().is_some());
}

#[test]
fn test_fixed_interval_polls_in_background() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let strategy = Arc::new(FixedIntervalPollingStrategy::new(Duration::from_millis(10)));
    let config = PollingConfig::builder(
        move || {
            let n = (counter.fetch_add(1, Ordering::SeqCst) + 1).to_string();
            Ok(snapshot(&[("n", n.as_str())]))
        },
        strategy.clone(),
    )
    .build()
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while calls.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(calls.load(Ordering::SeqCst) >= 3);
    assert!(config.get_integer("n").unwrap().is_some());

    drop(config);
    let deadline = Instant::now() + Duration::from_secs(5);
    while strategy.is_running() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(!strategy.is_running());
}

#[test]
fn test_fixed_interval_initial_poll_failure_fails_build() {
    let strategy = Arc::new(
        FixedIntervalPollingStrategy::new(Duration::from_secs(60)).with_initial_poll(true),
    );
    let result = PollingConfig::builder(|| Err("unreachable".into()), strategy.clone()).build();
    assert!(result.is_err());
    assert!(!strategy.is_running());
}
