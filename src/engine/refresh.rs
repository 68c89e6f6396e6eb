use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime};

use super::interface::Event;

struct RefreshEntry {
    interval: Duration,
    notify_tx: Sender<Event>,
    // Wall clock: Instant stops during sleep.
    last_fetch: Option<SystemTime>,
}

/// Tracks background refresh state for the bug list.
///
/// Only one listener is kept: registering again replaces it.
#[derive(Default)]
pub struct RefreshScheduler {
    entry: Option<RefreshEntry>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `notify_tx` to receive refreshed bug lists every `interval`.
    /// A zero interval disables background refresh.
    pub fn register(&mut self, interval: Duration, notify_tx: &Sender<Event>) {
        if interval.is_zero() {
            self.entry = None;
            return;
        }
        let last_fetch = self.entry.as_ref().and_then(|e| e.last_fetch);
        self.entry = Some(RefreshEntry {
            interval,
            notify_tx: notify_tx.clone(),
            last_fetch,
        });
    }

    /// Record that the bug list was just fetched.
    pub fn mark_fetched(&mut self) {
        self.mark_fetched_at(SystemTime::now());
    }

    fn mark_fetched_at(&mut self, at: SystemTime) {
        if let Some(entry) = &mut self.entry {
            entry.last_fetch = Some(at);
        }
    }

    /// The listener to refresh, if its interval has elapsed.
    ///
    /// Nothing is due before the first fetch; the view does the initial load.
    pub fn due(&self) -> Option<Sender<Event>> {
        self.due_at(SystemTime::now())
    }

    fn due_at(&self, now: SystemTime) -> Option<Sender<Event>> {
        self.entry
            .as_ref()
            .filter(|e| {
                e.last_fetch
                    .is_some_and(|t| now.duration_since(t).unwrap_or(Duration::ZERO) >= e.interval)
            })
            .map(|e| e.notify_tx.clone())
    }
}
