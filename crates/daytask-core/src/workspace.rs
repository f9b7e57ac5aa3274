//! Process-wide context owning every store and wiring mode transitions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::auth::{AuthSession, IdentityProvider, SessionPersistence};
use crate::db::{SharedDatabase, SqliteSettingsRepository};
use crate::error::{Error, Result};
use crate::mode::{ActorMode, ModeResolver, ModeTransition};
use crate::models::{Entity, Note, OwnerId, Task};
use crate::remote::{RemoteService, RemoteSession};
use crate::scheduler::NotificationScheduler;
use crate::state::{Activity, StatusTracker, SyncStatus};
use crate::store::{EntityStore, MergeReport, NotificationStore, SyncReport};

/// Bound satisfied by remote clients serving both synchronised kinds
pub trait Remote: RemoteService<Task> + RemoteService<Note> + RemoteSession {}

impl<R> Remote for R where R: RemoteService<Task> + RemoteService<Note> + RemoteSession {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub tasks: SyncReport,
    pub notes: SyncReport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub tasks: MergeReport,
    pub notes: MergeReport,
}

/// One instance of every store, constructed once and passed around.
///
/// Logging in (guest to authenticated) schedules a merge; entering
/// online-user runs a due merge and then replays the pending logs.
/// Failures during these automatic runs are recorded in the status
/// tracker instead of failing the transition.
pub struct Workspace<R, S> {
    tasks: EntityStore<Task, R>,
    notes: EntityStore<Note, R>,
    settings: SqliteSettingsRepository,
    notifications: NotificationStore,
    identity: IdentityProvider<S>,
    remote: Arc<R>,
    mode: ModeResolver,
    status: StatusTracker,
    merge_due: AtomicBool,
}

impl<R, S> Workspace<R, S>
where
    R: Remote,
    S: SessionPersistence,
{
    /// Restore the session, load the cache and catch up if already online.
    pub async fn open(
        db: SharedDatabase,
        remote: Arc<R>,
        sessions: S,
        is_online: bool,
        scheduler: Option<Arc<dyn NotificationScheduler>>,
    ) -> Result<Self> {
        let identity = IdentityProvider::new(sessions);
        let session = identity.restore()?;
        remote.set_access_token(session.as_ref().map(|session| session.access_token.clone()));

        let mut tasks = EntityStore::new(db.clone(), remote.clone());
        if let Some(scheduler) = scheduler {
            tasks = tasks.with_scheduler(scheduler);
        }

        let workspace = Self {
            tasks,
            notes: EntityStore::new(db.clone(), remote.clone()),
            settings: SqliteSettingsRepository::new(db.clone()),
            notifications: NotificationStore::new(db),
            identity,
            remote,
            mode: ModeResolver::new(session.is_some(), is_online),
            status: StatusTracker::new(is_online),
            merge_due: AtomicBool::new(false),
        };

        workspace.tasks.fetch_all().await?;
        workspace.notes.fetch_all().await?;
        workspace.refresh_pending().await?;

        // A login that happened offline leaves guest records without owner
        if session.is_some() && workspace.has_orphans().await {
            workspace.merge_due.store(true, Ordering::Release);
        }
        if workspace.mode() == ActorMode::OnlineUser {
            workspace.reconcile().await;
        }

        tracing::debug!("Workspace opened in {} mode", workspace.mode());
        Ok(workspace)
    }

    pub const fn tasks(&self) -> &EntityStore<Task, R> {
        &self.tasks
    }

    pub const fn notes(&self) -> &EntityStore<Note, R> {
        &self.notes
    }

    pub const fn settings(&self) -> &SqliteSettingsRepository {
        &self.settings
    }

    pub const fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub const fn identity(&self) -> &IdentityProvider<S> {
        &self.identity
    }

    pub fn mode(&self) -> ActorMode {
        self.mode.current()
    }

    pub const fn mode_resolver(&self) -> &ModeResolver {
        &self.mode
    }

    pub fn owner_id(&self) -> Option<OwnerId> {
        self.identity.owner_id()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.current()
    }

    pub const fn status_tracker(&self) -> &StatusTracker {
        &self.status
    }

    pub fn merge_due(&self) -> bool {
        self.merge_due.load(Ordering::Acquire)
    }

    /// Feed a connectivity change
    pub async fn set_online(&self, is_online: bool) -> ModeTransition {
        let transition = self.mode.set_online(is_online);
        self.status.set_online(is_online);
        if transition.entered_online() {
            self.reconcile().await;
        }
        transition
    }

    /// Adopt a session obtained from the login endpoint
    pub async fn sign_in(&self, session: AuthSession) -> Result<ModeTransition> {
        self.remote
            .set_access_token(Some(session.access_token.clone()));
        self.identity.sign_in(session)?;

        let transition = self.mode.set_authenticated(true);
        if transition.is_login() {
            self.merge_due.store(true, Ordering::Release);
        }
        if self.mode() == ActorMode::OnlineUser {
            self.reconcile().await;
        }
        Ok(transition)
    }

    /// Forget the session, the local records and any unsent changes.
    /// Queued entries belong to the account that made them and must not be
    /// replayed under the next account's token.
    pub async fn sign_out(&self) -> Result<ModeTransition> {
        self.identity.sign_out()?;
        self.remote.set_access_token(None);
        let transition = self.mode.set_authenticated(false);
        self.merge_due.store(false, Ordering::Release);

        self.tasks.remove_local().await?;
        self.notes.remove_local().await?;
        let discarded =
            self.tasks.discard_pending().await? + self.notes.discard_pending().await?;
        self.refresh_pending().await?;
        if discarded > 0 {
            tracing::warn!(discarded, "Signed out with unsent changes; they were dropped");
        }
        tracing::info!("Signed out; local records removed");
        Ok(transition)
    }

    /// Replay both pending logs. Both kinds are attempted; the first error wins.
    pub async fn sync_all(&self) -> Result<SyncSummary> {
        self.require_online()?;
        self.status.set_activity(Activity::Syncing);
        let tasks = self.tasks.sync().await;
        let notes = self.notes.sync().await;
        self.status.set_activity(Activity::Idle);
        self.refresh_pending().await?;

        let summary = SyncSummary {
            tasks: self.track(tasks)?,
            notes: self.track(notes)?,
        };
        self.status.clear_error();
        Ok(summary)
    }

    /// Merge both kinds for the current owner; a failure keeps the merge due.
    pub async fn merge_all(&self) -> Result<MergeSummary> {
        self.require_online()?;
        let owner = self.owner_id().ok_or(Error::NotAuthenticated)?;

        self.status.set_activity(Activity::Merging);
        let tasks = self.tasks.merge(&owner).await;
        let notes = self.notes.merge(&owner).await;
        self.status.set_activity(Activity::Idle);

        let summary = MergeSummary {
            tasks: self.track(tasks)?,
            notes: self.track(notes)?,
        };
        self.merge_due.store(false, Ordering::Release);
        self.status.clear_error();
        Ok(summary)
    }

    /// Update the pending counts shown in the status
    pub async fn refresh_pending(&self) -> Result<()> {
        self.status
            .set_pending(Task::KIND, self.tasks.pending_len().await?);
        self.status
            .set_pending(Note::KIND, self.notes.pending_len().await?);
        Ok(())
    }

    /// Due merge first, then sync. Errors end up in the status tracker.
    ///
    /// Sync waits for a failed merge to succeed on a later trigger.
    async fn reconcile(&self) {
        if self.merge_due() {
            if let Err(error) = self.merge_all().await {
                tracing::warn!("Failed to merge after login: {}", error);
                return;
            }
        }
        if let Err(error) = self.sync_all().await {
            tracing::warn!("Failed to sync pending operations: {}", error);
        }
    }

    fn require_online(&self) -> Result<()> {
        match self.mode() {
            ActorMode::OnlineUser => Ok(()),
            ActorMode::Guest => Err(Error::NotAuthenticated),
            ActorMode::OfflineUser => Err(Error::InvalidInput(
                "the remote service is unreachable".to_string(),
            )),
        }
    }

    fn track<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            self.status.record_error(error.to_string());
        }
        result
    }

    async fn has_orphans(&self) -> bool {
        let tasks = self.tasks.records().await;
        let notes = self.notes.records().await;
        tasks.iter().any(|task| task.owner_id.is_none())
            || notes.iter().any(|note| note.owner_id.is_none())
    }
}
