//! Durable queue of mutations recorded while offline

use std::collections::HashSet;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::SharedDatabase;
use crate::error::{Error, Result};
use crate::models::{Entity, EntityId};

/// A mutation intent waiting to be replayed remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction<T> {
    Add(T),
    Update(T),
    Delete(EntityId),
}

impl<T: Entity> SyncAction<T> {
    /// Id of the record the action targets
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::Add(entity) | Self::Update(entity) => entity.id(),
            Self::Delete(id) => id,
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

/// One persisted log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry<T> {
    /// Insertion order, strictly increasing
    pub seq: i64,
    pub action: SyncAction<T>,
    pub recorded_at: DateTime<Utc>,
}

type RawEntry = (i64, String, String, Option<String>, String);

/// Append-only log per entity kind; drained only by sync.
pub struct PendingLog<T> {
    db: SharedDatabase,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for PendingLog<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> PendingLog<T> {
    pub const fn new(db: SharedDatabase) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Append an entry; returns its sequence number
    pub async fn append(&self, action: SyncAction<T>, recorded_at: DateTime<Utc>) -> Result<i64> {
        let payload = match &action {
            SyncAction::Add(entity) | SyncAction::Update(entity) => {
                Some(serde_json::to_string(entity)?)
            }
            SyncAction::Delete(_) => None,
        };

        let db = self.db.lock().await;
        db.connection().execute(
            &format!(
                "INSERT INTO {} (action, entity_id, payload, recorded_at) VALUES (?1, ?2, ?3, ?4)",
                T::KIND.pending_table()
            ),
            params![
                action.label(),
                action.entity_id().as_str(),
                payload,
                recorded_at.to_rfc3339()
            ],
        )?;
        let seq = db.connection().last_insert_rowid();

        tracing::debug!("Queued {} of {} {}", action.label(), T::KIND, action.entity_id());
        Ok(seq)
    }

    /// Every entry in insertion order
    pub async fn entries(&self) -> Result<Vec<PendingEntry<T>>> {
        let raw = {
            let db = self.db.lock().await;
            let mut stmt = db.connection().prepare(&format!(
                "SELECT seq, action, entity_id, payload, recorded_at FROM {} ORDER BY seq",
                T::KIND.pending_table()
            ))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<RawEntry>>>()?;
            rows
        };

        raw.into_iter().map(decode_entry).collect()
    }

    pub async fn len(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let count: i64 = db.connection().query_row(
            &format!("SELECT COUNT(*) FROM {}", T::KIND.pending_table()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drop every entry up to and including `seq`
    ///
    /// Entries appended after a replay started keep their place.
    pub async fn remove_through(&self, seq: i64) -> Result<usize> {
        let db = self.db.lock().await;
        let removed = db.connection().execute(
            &format!("DELETE FROM {} WHERE seq <= ?1", T::KIND.pending_table()),
            params![seq],
        )?;
        Ok(removed)
    }

    /// Drop every entry; returns how many were discarded
    pub async fn clear(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let removed = db
            .connection()
            .execute(&format!("DELETE FROM {}", T::KIND.pending_table()), [])?;
        Ok(removed)
    }

    /// Ids that have a queued delete
    pub async fn pending_deletes(&self) -> Result<HashSet<EntityId>> {
        let db = self.db.lock().await;
        let mut stmt = db.connection().prepare(&format!(
            "SELECT DISTINCT entity_id FROM {} WHERE action = 'delete'",
            T::KIND.pending_table()
        ))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        ids.iter().map(|id| id.parse()).collect()
    }
}

fn decode_entry<T: Entity>(
    (seq, action, entity_id, payload, recorded_at): RawEntry,
) -> Result<PendingEntry<T>> {
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
        .map_err(|e| Error::InvalidInput(format!("bad pending timestamp '{recorded_at}': {e}")))?
        .with_timezone(&Utc);

    let action = match (action.as_str(), payload) {
        ("add", Some(payload)) => SyncAction::Add(serde_json::from_str(&payload)?),
        ("update", Some(payload)) => SyncAction::Update(serde_json::from_str(&payload)?),
        ("delete", _) => SyncAction::Delete(entity_id.parse()?),
        (other, _) => {
            return Err(Error::InvalidInput(format!(
                "malformed pending entry {seq}: action '{other}'"
            )))
        }
    };

    Ok(PendingEntry {
        seq,
        action,
        recorded_at,
    })
}
