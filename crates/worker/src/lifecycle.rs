//! Channel-lifecycle tracker (§3 "Channel lifecycle state", §4.D "Dispatch
//! & channel lifecycle", "Inactivity sweeper"). Owned by the consuming
//! worker process; discarded on worker exit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Active,
    Inactive,
}

/// In-process record for a single channel the worker has observed traffic for.
#[derive(Debug, Clone)]
pub struct ChannelLifecycle {
    pub state: ChannelState,
    pub first_message_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub message_count: u64,
}

/// Tracks every channel currently considered active by this worker.
#[derive(Default)]
pub struct LifecycleTracker {
    channels: HashMap<String, ChannelLifecycle>,
}

impl LifecycleTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `channel`. Returns `true` if this is the
    /// channel's first observed message (caller should emit
    /// `channel:active` before `channel:message`).
    pub fn record_message(&mut self, channel: &str, at: DateTime<Utc>) -> bool {
        match self.channels.get_mut(channel) {
            Some(entry) => {
                entry.last_message_at = at;
                entry.message_count += 1;
                false
            },
            None => {
                self.channels.insert(
                    channel.to_string(),
                    ChannelLifecycle {
                        state: ChannelState::Active,
                        first_message_at: at,
                        last_message_at: at,
                        message_count: 1,
                    },
                );
                true
            },
        }
    }

    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&ChannelLifecycle> {
        self.channels.get(channel)
    }

    /// Remove and return every channel whose `last_message_at` is older
    /// than `cutoff` (§4.D "Inactivity sweeper").
    pub fn sweep_inactive(&mut self, cutoff: DateTime<Utc>) -> Vec<(String, ChannelLifecycle)> {
        let stale: Vec<String> = self
            .channels
            .iter()
            .filter(|(_, entry)| entry.last_message_at < cutoff)
            .map(|(channel, _)| channel.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|channel| self.channels.remove(&channel).map(|entry| (channel, entry)))
            .collect()
    }

    /// Remove every tracked channel, marking each inactive (§4.D "On
    /// graceful `stop`: ... mark all tracked channels inactive").
    pub fn drain_all(&mut self) -> Vec<(String, ChannelLifecycle)> {
        self.channels.drain().collect()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn first_message_reports_newly_active() {
        let mut tracker = LifecycleTracker::new();
        let t0 = Utc::now();
        assert!(tracker.record_message("chat", t0));
        assert!(!tracker.record_message("chat", t0 + Duration::seconds(1)));

        let entry = tracker.get("chat").unwrap();
        assert_eq!(entry.message_count, 2);
        assert_eq!(entry.first_message_at, t0);
    }

    #[test]
    fn sweep_removes_only_stale_channels() {
        let mut tracker = LifecycleTracker::new();
        let t0 = Utc::now();
        tracker.record_message("stale", t0 - Duration::seconds(60));
        tracker.record_message("fresh", t0);

        let swept = tracker.sweep_inactive(t0 - Duration::seconds(30));
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].0, "stale");
        assert!(tracker.get("fresh").is_some());
        assert!(tracker.get("stale").is_none());
    }

    #[test]
    fn drain_all_empties_tracker() {
        let mut tracker = LifecycleTracker::new();
        tracker.record_message("a", Utc::now());
        tracker.record_message("b", Utc::now());
        let drained = tracker.drain_all();
        assert_eq!(drained.len(), 2);
        assert!(tracker.get("a").is_none());
    }
}
