//! Observable sync status shown to the user.

use std::fmt;

use tokio::sync::watch;

use crate::models::EntityKind;

/// What the reconciliation engine is doing right now
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Idle,
    Syncing,
    Merging,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Syncing => f.write_str("syncing"),
            Self::Merging => f.write_str("merging"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub online: bool,
    pub activity: Activity,
    pub pending_tasks: usize,
    pub pending_notes: usize,
    /// Message of the most recent sync or merge failure
    pub last_error: Option<String>,
}

impl SyncStatus {
    #[must_use]
    pub const fn pending_total(&self) -> usize {
        self.pending_tasks + self.pending_notes
    }
}

/// Publishes [`SyncStatus`] changes to any number of watchers
pub struct StatusTracker {
    status: watch::Sender<SyncStatus>,
}

impl StatusTracker {
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (status, _) = watch::channel(SyncStatus {
            online,
            ..SyncStatus::default()
        });
        Self { status }
    }

    #[must_use]
    pub fn current(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn set_online(&self, online: bool) {
        self.status.send_modify(|status| status.online = online);
    }

    pub fn set_activity(&self, activity: Activity) {
        self.status.send_modify(|status| status.activity = activity);
    }

    pub fn set_pending(&self, kind: EntityKind, count: usize) {
        self.status.send_modify(|status| match kind {
            EntityKind::Task => status.pending_tasks = count,
            EntityKind::Note => status.pending_notes = count,
        });
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.status
            .send_modify(|status| status.last_error = Some(message));
    }

    pub fn clear_error(&self) {
        self.status.send_modify(|status| status.last_error = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_counts_per_kind() {
        let tracker = StatusTracker::new(true);
        tracker.set_pending(EntityKind::Task, 2);
        tracker.set_pending(EntityKind::Note, 1);

        let status = tracker.current();
        assert_eq!(status.pending_total(), 3);
        assert!(status.online);
    }

    #[tokio::test]
    async fn test_watchers_see_errors() {
        let tracker = StatusTracker::new(false);
        let mut rx = tracker.subscribe();

        tracker.record_error("Sync stopped at entry 2 of 3");

        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().last_error.as_deref(),
            Some("Sync stopped at entry 2 of 3")
        );
        tracker.clear_error();
        assert!(tracker.current().last_error.is_none());
    }
}
