//! Process-wide maintenance around the sweep.

use std::sync::Mutex;

/// Callbacks the sweeper invokes between statements it does not own.
///
/// A store backed by a live application typically pauses derived counters
/// while rows disappear and flushes in-process caches between batches.
pub trait MaintenanceHooks: Send + Sync {
    /// Called with `true` before the first batch and `false` after the last,
    /// also when the sweep aborts.
    fn defer_counts(&self, _defer: bool) {}

    /// Called after every deleted batch.
    fn free_resources(&self) {}
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl MaintenanceHooks for NoopHooks {}

/// One recorded hook call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookEvent {
    DeferCounts(bool),
    FreeResources,
}

/// Hooks that remember every call, in order.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: HookEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl MaintenanceHooks for RecordingHooks {
    fn defer_counts(&self, defer: bool) {
        self.push(HookEvent::DeferCounts(defer));
    }

    fn free_resources(&self) {
        self.push(HookEvent::FreeResources);
    }
}
