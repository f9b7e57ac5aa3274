//! Local notification inbox

use std::cmp::Reverse;

use crate::db::{LocalStore, SharedDatabase};
use crate::error::{Error, Result};
use crate::models::{EntityId, Notification};

/// Notifications are device-local and never synced
#[derive(Clone)]
pub struct NotificationStore {
    local: LocalStore<Notification>,
}

impl NotificationStore {
    pub const fn new(db: SharedDatabase) -> Self {
        Self {
            local: LocalStore::new(db),
        }
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<Notification>> {
        let mut notifications = self.local.list().await?;
        notifications.sort_by_key(|notification| Reverse(notification.created_at));
        Ok(notifications)
    }

    pub async fn add(&self, notification: &Notification) -> Result<()> {
        self.local.put(notification).await
    }

    pub async fn mark_as_read(&self, id: &EntityId) -> Result<Notification> {
        let mut notification = self
            .local
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("notification {id}")))?;
        notification.read = true;
        self.local.put(&notification).await?;
        Ok(notification)
    }

    pub async fn mark_all_as_read(&self) -> Result<usize> {
        let unread = self
            .local
            .list()
            .await?
            .into_iter()
            .filter(|notification| !notification.read)
            .map(|mut notification| {
                notification.read = true;
                notification
            })
            .collect::<Vec<_>>();
        self.local.put_many(&unread).await?;
        Ok(unread.len())
    }

    pub async fn delete(&self, id: &EntityId) -> Result<bool> {
        self.local.delete(id).await
    }

    pub async fn unread_count(&self) -> Result<usize> {
        Ok(self
            .local
            .list()
            .await?
            .iter()
            .filter(|notification| !notification.read)
            .count())
    }

    pub async fn replace_all(&self, notifications: &[Notification]) -> Result<()> {
        self.local.replace_all(notifications).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn setup() -> NotificationStore {
        NotificationStore::new(Database::open_in_memory().unwrap().into_shared())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_newest_first() {
        let store = setup();
        let mut old = Notification::new("old", "first", None);
        old.created_at = Utc::now() - Duration::hours(1);
        let new = Notification::new("new", "second", None);

        store.add(&old).await.unwrap();
        store.add(&new).await.unwrap();

        let titles = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_as_read() {
        let store = setup();
        let notification = Notification::new("Task Reminder", "Reminder for task: x", None);
        store.add(&notification).await.unwrap();
        assert_eq!(store.unread_count().await.unwrap(), 1);

        let read = store.mark_as_read(&notification.id).await.unwrap();

        assert!(read.read);
        assert_eq!(store.unread_count().await.unwrap(), 0);
        assert!(matches!(
            store.mark_as_read(&EntityId::new()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_all_and_delete() {
        let store = setup();
        let first = Notification::new("a", "a", None);
        store.add(&first).await.unwrap();
        store.add(&Notification::new("b", "b", None)).await.unwrap();

        assert_eq!(store.mark_all_as_read().await.unwrap(), 2);
        assert!(store.delete(&first.id).await.unwrap());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
