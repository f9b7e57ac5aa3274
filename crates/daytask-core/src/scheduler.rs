//! Reminder delivery at a future instant

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::models::Notification;

/// Emits a notification at or after a given instant
pub trait NotificationScheduler: Send + Sync {
    fn schedule(&self, at: DateTime<Utc>, notification: Notification);
}

/// Timer-based scheduler; due notifications arrive on the paired receiver.
///
/// Must be used from inside a tokio runtime.
#[derive(Clone)]
pub struct TokioNotificationScheduler {
    sender: mpsc::UnboundedSender<Notification>,
}

impl TokioNotificationScheduler {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationScheduler for TokioNotificationScheduler {
    fn schedule(&self, at: DateTime<Utc>, notification: Notification) {
        // Instants in the past fire immediately
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        let sender = self.sender.clone();
        tracing::debug!("Scheduling reminder '{}' in {:?}", notification.title, delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(notification).is_err() {
                tracing::warn!("Dropped reminder: receiver closed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_past_due_reminder_fires_immediately() {
        let (scheduler, mut receiver) = TokioNotificationScheduler::new();
        let notification = Notification::new("Task Reminder", "Reminder for task: x", None);

        scheduler.schedule(Utc::now() - Duration::minutes(5), notification.clone());

        let delivered = receiver.recv().await.unwrap();
        assert_eq!(delivered, notification);
    }

    #[tokio::test]
    async fn test_reminders_arrive_in_due_order() {
        let (scheduler, mut receiver) = TokioNotificationScheduler::new();
        let later = Notification::new("later", "b", None);
        let sooner = Notification::new("sooner", "a", None);

        scheduler.schedule(Utc::now() + Duration::milliseconds(60), later);
        scheduler.schedule(Utc::now(), sooner);

        assert_eq!(receiver.recv().await.unwrap().title, "sooner");
        assert_eq!(receiver.recv().await.unwrap().title, "later");
    }
}
