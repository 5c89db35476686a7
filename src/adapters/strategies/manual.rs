// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-driven polling.

use crate::domain::{ConfigError, Result};
use crate::ports::{PollTask, PollingStrategy};
use parking_lot::Mutex;
use std::fmt;

const SOURCE_NAME: &str = "manual-polling";

/// Polls only when [`fire`](ManualPollingStrategy::fire) is called.
///
/// The poll runs on the calling thread and its outcome, including a fetch
/// failure, is returned directly, which keeps tests deterministic.
#[derive(Default)]
pub struct ManualPollingStrategy {
    task: Mutex<Option<PollTask>>,
}

impl ManualPollingStrategy {
    /// Creates a strategy with no task attached yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one poll of the attached config.
    pub fn fire(&self) -> Result<()> {
        // Released before polling so the config may be dropped from inside.
        let task = self.task.lock().clone();
        match task {
            Some(task) => task(),
            None => Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "no polling config attached".to_string(),
                source: None,
            }),
        }
    }

    /// Returns `true` while a config is attached.
    pub fn is_attached(&self) -> bool {
        self.task.lock().is_some()
    }
}

impl PollingStrategy for ManualPollingStrategy {
    fn execute(&self, task: PollTask) -> Result<()> {
        let mut slot = self.task.lock();
        if slot.is_some() {
            return Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "strategy already drives a polling config".to_string(),
                source: None,
            });
        }
        *slot = Some(task);
        Ok(())
    }

    fn shutdown(&self) {
        self.task.lock().take();
    }
}

impl fmt::Debug for ManualPollingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualPollingStrategy")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fire_without_task() {
        let strategy = ManualPollingStrategy::new();
        assert!(strategy.fire().is_err());
    }

    #[test]
    fn test_fire_runs_task_on_caller() {
        let strategy = ManualPollingStrategy::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        strategy
            .execute(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
        strategy.fire().unwrap();
        strategy.fire().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_second_task_rejected() {
        let strategy = ManualPollingStrategy::new();
        strategy.execute(Arc::new(|| Ok(()))).unwrap();
        assert!(strategy.execute(Arc::new(|| Ok(()))).is_err());
    }

    #[test]
    fn test_shutdown_detaches() {
        let strategy = ManualPollingStrategy::new();
        strategy.execute(Arc::new(|| Ok(()))).unwrap();
        strategy.shutdown();
        strategy.shutdown();
        assert!(!strategy.is_attached());
        assert!(strategy.fire().is_err());
    }
}
