//! Per-kind entity store: mode-aware mutations over the local table

mod merge;
mod notifications;
mod sync;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::db::{LocalStore, PendingEntry, PendingLog, SharedDatabase, SyncAction};
use crate::error::{Error, Result};
use crate::mode::ActorMode;
use crate::models::{Entity, EntityId, OwnerId};
use crate::remote::RemoteService;
use crate::scheduler::NotificationScheduler;

pub use merge::{merge_records, MergeOutcome, MergeReport};
pub use notifications::NotificationStore;
pub use sync::SyncReport;

/// Public API for one entity kind.
///
/// Every mutation is written through to the local table and mirrored into
/// the in-memory cache. The actor mode decides what else happens:
/// online users hit the server first, offline users queue a pending entry,
/// guests stay local.
pub struct EntityStore<T, R> {
    local: LocalStore<T>,
    pending: PendingLog<T>,
    remote: Arc<R>,
    cache: RwLock<BTreeMap<EntityId, T>>,
    syncing: AtomicBool,
    merging: AtomicBool,
    scheduler: Option<Arc<dyn NotificationScheduler>>,
}

impl<T, R> EntityStore<T, R>
where
    T: Entity,
    R: RemoteService<T>,
{
    pub fn new(db: SharedDatabase, remote: Arc<R>) -> Self {
        Self {
            local: LocalStore::new(db.clone()),
            pending: PendingLog::new(db),
            remote,
            cache: RwLock::new(BTreeMap::new()),
            syncing: AtomicBool::new(false),
            merging: AtomicBool::new(false),
            scheduler: None,
        }
    }

    /// Hand reminders of newly created records to `scheduler`
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Load every local record into the cache. Never contacts the server.
    pub async fn fetch_all(&self) -> Result<Vec<T>> {
        let records = self.local.list().await?;
        let mut cache = self.cache.write().await;
        *cache = records
            .iter()
            .map(|record| (record.id().clone(), record.clone()))
            .collect();
        Ok(records)
    }

    /// Cached records ordered by id
    pub async fn records(&self) -> Vec<T> {
        self.cache.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: &EntityId) -> Option<T> {
        self.cache.read().await.get(id).cloned()
    }

    pub async fn create(
        &self,
        draft: T::Draft,
        mode: ActorMode,
        owner: Option<&OwnerId>,
    ) -> Result<T> {
        let owner = match mode {
            ActorMode::Guest => None,
            ActorMode::OfflineUser | ActorMode::OnlineUser => {
                Some(owner.cloned().ok_or(Error::NotAuthenticated)?)
            }
        };
        let now = Utc::now();
        let entity = T::from_draft(draft, EntityId::new(), owner, now)?;

        match mode {
            ActorMode::OnlineUser => self.remote.create(&entity).await?,
            ActorMode::OfflineUser => {
                self.pending
                    .append(SyncAction::Add(entity.clone()), now)
                    .await?;
            }
            ActorMode::Guest => {}
        }

        self.write_local(&entity).await?;

        if let Some((at, notification)) = entity.reminder() {
            if at > now {
                if let Some(scheduler) = &self.scheduler {
                    scheduler.schedule(at, notification);
                }
            }
        }

        Ok(entity)
    }

    /// Persist an edited record, refreshing `updated_at`
    pub async fn update(&self, mut entity: T, mode: ActorMode) -> Result<T> {
        let now = Utc::now();
        entity.touch(now);

        match mode {
            ActorMode::OnlineUser => self.remote.update(&entity).await?,
            ActorMode::OfflineUser => {
                self.pending
                    .append(SyncAction::Update(entity.clone()), now)
                    .await?;
            }
            ActorMode::Guest => {}
        }

        self.write_local(&entity).await?;
        Ok(entity)
    }

    /// Apply `edit` to the cached record with `id`, then [`Self::update`] it
    pub async fn modify(
        &self,
        id: &EntityId,
        mode: ActorMode,
        edit: impl FnOnce(&mut T) -> Result<()>,
    ) -> Result<T> {
        let mut entity = self
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("{} {id}", T::KIND)))?;
        edit(&mut entity)?;
        self.update(entity, mode).await
    }

    /// Delete by id; returns whether the record existed locally
    pub async fn delete(&self, id: &EntityId, mode: ActorMode) -> Result<bool> {
        match mode {
            ActorMode::OnlineUser => self.remote.delete(id).await?,
            ActorMode::OfflineUser => {
                self.pending
                    .append(SyncAction::Delete(id.clone()), Utc::now())
                    .await?;
            }
            ActorMode::Guest => {}
        }

        let existed = self.local.delete(id).await?;
        self.cache.write().await.remove(id);
        Ok(existed)
    }

    /// Forget every local record; the pending log is left alone
    pub async fn remove_local(&self) -> Result<()> {
        self.local.clear().await?;
        self.cache.write().await.clear();
        Ok(())
    }

    /// Drop every queued entry without replaying it; returns how many were dropped
    pub async fn discard_pending(&self) -> Result<usize> {
        self.pending.clear().await
    }

    pub async fn pending_len(&self) -> Result<usize> {
        self.pending.len().await
    }

    pub async fn pending_entries(&self) -> Result<Vec<PendingEntry<T>>> {
        self.pending.entries().await
    }

    async fn write_local(&self, entity: &T) -> Result<()> {
        self.local.put(entity).await?;
        self.cache
            .write()
            .await
            .insert(entity.id().clone(), entity.clone());
        Ok(())
    }
}

/// Marks a sync or merge as running until dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, what: impl FnOnce() -> String) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AlreadyRunning(what()))?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
