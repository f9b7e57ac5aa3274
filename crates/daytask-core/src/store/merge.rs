//! Login-time reconciliation of local and server records

use std::collections::{BTreeMap, HashSet};

use super::{EntityStore, InFlight};
use crate::error::{Error, MergeStage, Result};
use crate::models::{Entity, EntityId, OwnerId};
use crate::remote::RemoteService;

/// Counts of how each merged id was resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Local-only records taken over by the owner
    pub adopted: usize,
    /// Present on both sides, local strictly newer
    pub local_wins: usize,
    /// Present on both sides, server newer or tied
    pub remote_wins: usize,
    pub remote_only: usize,
    /// Skipped because a delete is still queued
    pub skipped_deletes: usize,
}

impl MergeReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.adopted + self.local_wins + self.remote_wins + self.remote_only
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome<T> {
    /// The merged set, ordered by id
    pub records: Vec<T>,
    pub report: MergeReport,
}

/// Union `remote` and `local` with last-write-wins on `updated_at`.
///
/// Local records win only when strictly newer; every record taken from the
/// local side is stamped with `owner`. `updated_at` itself is never touched,
/// so merging the output again yields the same set.
pub fn merge_records<T: Entity>(
    remote: Vec<T>,
    local: Vec<T>,
    owner: &OwnerId,
    pending_deletes: &HashSet<EntityId>,
) -> MergeOutcome<T> {
    let mut report = MergeReport::default();
    let mut remote = remote
        .into_iter()
        .map(|record| (record.id().clone(), record))
        .collect::<BTreeMap<_, _>>();
    let mut merged = BTreeMap::new();

    for mut record in local {
        let id = record.id().clone();
        if pending_deletes.contains(&id) {
            remote.remove(&id);
            report.skipped_deletes += 1;
            continue;
        }

        match remote.remove(&id) {
            Some(server) if record.updated_at() <= server.updated_at() => {
                report.remote_wins += 1;
                merged.insert(id, server);
            }
            Some(_) => {
                record.set_owner_id(owner.clone());
                report.local_wins += 1;
                merged.insert(id, record);
            }
            None => {
                record.set_owner_id(owner.clone());
                report.adopted += 1;
                merged.insert(id, record);
            }
        }
    }

    for (id, record) in remote {
        if pending_deletes.contains(&id) {
            report.skipped_deletes += 1;
            continue;
        }
        report.remote_only += 1;
        merged.insert(id, record);
    }

    MergeOutcome {
        records: merged.into_values().collect(),
        report,
    }
}

impl<T, R> EntityStore<T, R>
where
    T: Entity,
    R: RemoteService<T>,
{
    /// Reconcile the local table with the owner's server records.
    ///
    /// Safe to run again after any failure: every write is an upsert by id.
    pub async fn merge(&self, owner: &OwnerId) -> Result<MergeReport> {
        let _in_flight = InFlight::acquire(&self.merging, || format!("merge of {}", T::KIND))?;

        let remote = self
            .remote
            .list_by_owner(owner)
            .await
            .map_err(|source| Error::Merge {
                stage: MergeStage::RemoteRead,
                source,
            })?;
        let local = self.local.list().await?;
        let pending_deletes = self.pending.pending_deletes().await?;

        let MergeOutcome { records, report } =
            merge_records(remote, local, owner, &pending_deletes);

        self.local.put_many(&records).await?;
        self.fetch_all().await?;

        if !records.is_empty() {
            if let Err(source) = self.remote.bulk_upsert(&records).await {
                tracing::warn!("Failed to push merged {}: {}", T::KIND, source);
                return Err(Error::Merge {
                    stage: MergeStage::RemoteWrite,
                    source,
                });
            }
        }

        tracing::info!(
            "Merged {} {} for {} ({} adopted, {} local wins, {} server wins, {} server only)",
            report.total(),
            T::KIND,
            owner,
            report.adopted,
            report.local_wins,
            report.remote_wins,
            report.remote_only
        );
        Ok(report)
    }
}
