//! Traits shared by everything the local store can hold

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use super::{EntityId, Notification, OwnerId};
use crate::error::Result;

/// The synchronised entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Task,
    Note,
}

impl EntityKind {
    /// Local table holding the records
    pub const fn table(self) -> &'static str {
        match self {
            Self::Task => "tasks",
            Self::Note => "notes",
        }
    }

    /// Local table holding the pending-operation log
    pub const fn pending_table(self) -> &'static str {
        match self {
            Self::Task => "tasks_pending",
            Self::Note => "notes_pending",
        }
    }

    /// Path segment used by the remote API
    pub const fn remote_path(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// A value persisted in a local table keyed by id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table the records live in
    const TABLE: &'static str;

    fn id(&self) -> &EntityId;
}

/// A record that takes part in the offline/online reconciliation.
pub trait Entity: Record {
    const KIND: EntityKind;

    /// Creation input, validated in [`Entity::from_draft`]
    type Draft;

    /// Build a fresh record from user input.
    fn from_draft(
        draft: Self::Draft,
        id: EntityId,
        owner: Option<OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Self>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Refresh `updated_at`; it never moves backwards.
    fn touch(&mut self, now: DateTime<Utc>);

    fn owner_id(&self) -> Option<&OwnerId>;

    fn set_owner_id(&mut self, owner: OwnerId);

    /// A notification to deliver at some instant, if the record asks for one.
    fn reminder(&self) -> Option<(DateTime<Utc>, Notification)> {
        None
    }
}
