//! Replay of the pending log against the server

use super::{EntityStore, InFlight};
use crate::db::SyncAction;
use crate::error::{Error, Result};
use crate::models::Entity;
use crate::remote::RemoteService;

/// Outcome of a successful sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries replayed and removed from the log
    pub replayed: usize,
}

impl<T, R> EntityStore<T, R>
where
    T: Entity,
    R: RemoteService<T>,
{
    /// Replay every pending entry in insertion order.
    ///
    /// The log is drained only when the whole batch succeeded. On the first
    /// failure nothing is removed and the failing position is reported.
    pub async fn sync(&self) -> Result<SyncReport> {
        let _in_flight = InFlight::acquire(&self.syncing, || format!("sync of {}", T::KIND))?;

        let entries = self.pending.entries().await?;
        let Some(last_seq) = entries.last().map(|entry| entry.seq) else {
            return Ok(SyncReport::default());
        };
        let total = entries.len();

        for (index, entry) in entries.iter().enumerate() {
            tracing::debug!(
                "Replaying pending entry {} of {} for {} ({})",
                index + 1,
                total,
                T::KIND,
                entry.action.entity_id()
            );
            let result = match &entry.action {
                SyncAction::Add(entity) => self.remote.create(entity).await,
                SyncAction::Update(entity) => self.remote.update(entity).await,
                SyncAction::Delete(id) => self.remote.delete(id).await,
            };

            if let Err(source) = result {
                tracing::warn!(
                    "Failed to sync {}: entry {} of {} was rejected: {}",
                    T::KIND,
                    index + 1,
                    total,
                    source
                );
                return Err(Error::SyncReplay {
                    position: index + 1,
                    total,
                    source,
                });
            }
        }

        self.pending.remove_through(last_seq).await?;
        tracing::info!("Synced {} pending {} operations", total, T::KIND);
        Ok(SyncReport { replayed: total })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::Database;
    use crate::mode::ActorMode;
    use crate::models::{OwnerId, Task, TaskDraft};
    use crate::remote::memory::{MemoryRemote, RemoteOp};
    use pretty_assertions::assert_eq;

    fn setup() -> (EntityStore<Task, MemoryRemote>, Arc<MemoryRemote>) {
        let remote = Arc::new(MemoryRemote::new());
        let db = Database::open_in_memory().unwrap().into_shared();
        (EntityStore::new(db, remote.clone()), remote)
    }

    fn owner() -> OwnerId {
        "u1".parse().unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_log_makes_no_calls() {
        let (store, remote) = setup();

        let report = store.sync().await.unwrap();

        assert_eq!(report.replayed, 0);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replay_preserves_order_and_drains_log() {
        let (store, remote) = setup();
        let mode = ActorMode::OfflineUser;
        let task = store
            .create(TaskDraft::new("a"), mode, Some(&owner()))
            .await
            .unwrap();
        let task = store.update(task, mode).await.unwrap();
        store.delete(&task.id, mode).await.unwrap();

        let report = store.sync().await.unwrap();

        assert_eq!(report.replayed, 3);
        let ops = remote
            .calls()
            .into_iter()
            .map(|call| call.op)
            .collect::<Vec<_>>();
        assert_eq!(ops, vec![RemoteOp::Create, RemoteOp::Update, RemoteOp::Delete]);
        assert_eq!(store.pending_len().await.unwrap(), 0);
        assert!(remote.get::<Task>(task.id.as_str()).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_keeps_whole_batch() {
        let (store, remote) = setup();
        let mode = ActorMode::OfflineUser;
        for title in ["first", "second", "third"] {
            store
                .create(TaskDraft::new(title), mode, Some(&owner()))
                .await
                .unwrap();
        }
        let entries = store.pending_entries().await.unwrap();
        remote.fail_for(entries[1].action.entity_id().as_str());

        let error = store.sync().await.unwrap_err();

        assert!(matches!(
            error,
            Error::SyncReplay {
                position: 2,
                total: 3,
                ..
            }
        ));
        assert_eq!(store.pending_entries().await.unwrap(), entries);
        assert_eq!(remote.calls_of(RemoteOp::Create).len(), 2);

        // Retrying after recovery replays everything, the first add included
        remote.heal();
        assert_eq!(store.sync().await.unwrap().replayed, 3);
        assert_eq!(remote.records::<Task>().len(), 3);
    }
}
