// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for the integration tests.

use livecfg::domain::{ConfigError, DecodeError, PropertyChange};
use livecfg::ports::{Config, ConfigListener, Decoder};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// One event seen by a [`RecordingListener`].
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Added(String),
    Removed(String),
    Updated(String, PropertyChange),
    Error(String),
}

/// Records every event together with the name of the config that emitted it.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

#[allow(dead_code)]
impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn added(&self) -> usize {
        self.count(|e| matches!(e, Event::Added(_)))
    }

    pub fn removed(&self) -> usize {
        self.count(|e| matches!(e, Event::Removed(_)))
    }

    pub fn updates(&self) -> Vec<PropertyChange> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Updated(_, change) => Some(change.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> usize {
        self.count(|e| matches!(e, Event::Error(_)))
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }
}

impl ConfigListener for RecordingListener {
    fn on_config_added(&self, config: &dyn Config) {
        self.events.lock().push(Event::Added(config.name().to_string()));
    }

    fn on_config_removed(&self, config: &dyn Config) {
        self.events
            .lock()
            .push(Event::Removed(config.name().to_string()));
    }

    fn on_config_updated(&self, config: &dyn Config, change: &PropertyChange) {
        self.events
            .lock()
            .push(Event::Updated(config.name().to_string(), change.clone()));
    }

    fn on_error(&self, error: &ConfigError, _config: &dyn Config) {
        self.events.lock().push(Event::Error(error.to_string()));
    }
}

/// Decodes every `i32` request to a fixed value and rejects other types.
#[allow(dead_code)]
pub struct FixedIntDecoder(pub i32);

impl Decoder for FixedIntDecoder {
    fn decode_any(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        _raw: &str,
    ) -> Result<Box<dyn Any + Send>, DecodeError> {
        if type_id == TypeId::of::<i32>() {
            Ok(Box::new(self.0))
        } else {
            Err(DecodeError::UnsupportedType {
                target_type: type_name,
            })
        }
    }
}
