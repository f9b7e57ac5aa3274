//! In-memory remote service with failure injection, for tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::{RemoteError, RemoteResult, RemoteService, RemoteSession};
use crate::models::{Entity, EntityId, EntityKind, OwnerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Create,
    Update,
    Delete,
    ListByOwner,
    BulkUpsert,
}

/// One attempted call, recorded before failure injection applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub kind: EntityKind,
    pub op: RemoteOp,
    /// Entity id, owner id, or the number of records for bulk calls
    pub target: String,
}

#[derive(Default)]
struct State {
    records: HashMap<EntityKind, BTreeMap<EntityId, serde_json::Value>>,
    calls: Vec<RemoteCall>,
    failing_ids: HashSet<String>,
    failing_ops: HashSet<RemoteOp>,
    unreachable: bool,
    access_token: Option<String>,
}

#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if it already lived on the server
    pub fn insert<T: Entity>(&self, entity: &T) {
        let mut state = self.state.lock().unwrap();
        state
            .records
            .entry(T::KIND)
            .or_default()
            .insert(entity.id().clone(), serde_json::to_value(entity).unwrap());
    }

    pub fn records<T: Entity>(&self) -> Vec<T> {
        let state = self.state.lock().unwrap();
        state
            .records
            .get(&T::KIND)
            .map(|records| {
                records
                    .values()
                    .map(|value| serde_json::from_value(value.clone()).unwrap())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get<T: Entity>(&self, id: &str) -> Option<T> {
        self.records::<T>()
            .into_iter()
            .find(|record| record.id().as_str() == id)
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_of(&self, op: RemoteOp) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.op == op)
            .collect()
    }

    /// Any call targeting `id` fails
    pub fn fail_for(&self, id: &str) {
        self.state.lock().unwrap().failing_ids.insert(id.to_string());
    }

    pub fn fail_op(&self, op: RemoteOp) {
        self.state.lock().unwrap().failing_ops.insert(op);
    }

    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_ids.clear();
        state.failing_ops.clear();
        state.unreachable = false;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.lock().unwrap().access_token.clone()
    }

    fn record_call(&self, kind: EntityKind, op: RemoteOp, target: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall {
            kind,
            op,
            target: target.to_string(),
        });
        if state.unreachable {
            return Err(RemoteError::InvalidPayload("connection refused".to_string()));
        }
        if state.failing_ops.contains(&op) || state.failing_ids.contains(target) {
            return Err(RemoteError::Api {
                status: 500,
                message: format!("injected failure for {target}"),
            });
        }
        Ok(())
    }
}

impl RemoteSession for MemoryRemote {
    fn set_access_token(&self, token: Option<String>) {
        self.state.lock().unwrap().access_token = token;
    }
}

impl<T: Entity> RemoteService<T> for MemoryRemote {
    async fn create(&self, entity: &T) -> RemoteResult<()> {
        self.record_call(T::KIND, RemoteOp::Create, entity.id().as_str())?;
        self.insert(entity);
        Ok(())
    }

    async fn update(&self, entity: &T) -> RemoteResult<()> {
        self.record_call(T::KIND, RemoteOp::Update, entity.id().as_str())?;
        self.insert(entity);
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> RemoteResult<()> {
        self.record_call(T::KIND, RemoteOp::Delete, id.as_str())?;
        let mut state = self.state.lock().unwrap();
        if let Some(records) = state.records.get_mut(&T::KIND) {
            records.remove(id);
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> RemoteResult<Vec<T>> {
        self.record_call(T::KIND, RemoteOp::ListByOwner, owner.as_str())?;
        Ok(self
            .records::<T>()
            .into_iter()
            .filter(|record| record.owner_id() == Some(owner))
            .collect())
    }

    async fn bulk_upsert(&self, entities: &[T]) -> RemoteResult<()> {
        self.record_call(T::KIND, RemoteOp::BulkUpsert, &entities.len().to_string())?;
        for entity in entities {
            self.insert(entity);
        }
        Ok(())
    }
}
