//! Import of the flat-file access lists (two JSON arrays of user ids).

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::contract::model::{Identity, UserStatus};
use crate::domain::repo::{StatusStore, TransitionOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyLists {
    pub pending: Vec<i64>,
    pub approved: Vec<i64>,
}

/// Counts of what an import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub pending: usize,
    pub approved: usize,
    /// Ids that already had a record, or were not valid identities.
    pub skipped: usize,
}

fn read_ids(path: &Path) -> anyhow::Result<Vec<i64>> {
    if !path.exists() {
        debug!(path = %path.display(), "Legacy list missing, treating as empty");
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

impl LegacyLists {
    /// Load both lists; a missing file reads as an empty list.
    pub fn load(pending: &Path, approved: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            pending: read_ids(pending)?,
            approved: read_ids(approved)?,
        })
    }

    /// Seed `store` with users it does not know yet, in file order. Approved
    /// wins when an id is on both lists. Records with any history are left
    /// untouched; an inert record left by an interrupted run is promoted.
    pub async fn import_into(&self, store: &dyn StatusStore) -> anyhow::Result<ImportReport> {
        let approved = first_occurrences(&self.approved, &HashSet::new());
        let approved_set: HashSet<i64> = approved.iter().copied().collect();
        let pending = first_occurrences(&self.pending, &approved_set);

        let mut report = ImportReport::default();
        let batches = [(pending, UserStatus::Pending), (approved, UserStatus::Approved)];
        for (ids, to) in batches {
            for id in ids {
                let identity = Identity(id);
                if !identity.is_valid() || !importable(store, identity).await? {
                    report.skipped += 1;
                    continue;
                }
                match store
                    .transition_from(identity, UserStatus::Inactive, to)
                    .await?
                {
                    TransitionOutcome::Applied { .. } if to.approved() => report.approved += 1,
                    TransitionOutcome::Applied { .. } => report.pending += 1,
                    TransitionOutcome::Skipped { current } => {
                        debug!(user_id = id, %current, "Record changed during import, skipped");
                        report.skipped += 1;
                    }
                    TransitionOutcome::Missing => {
                        anyhow::bail!("record for {id} vanished during import")
                    }
                }
            }
        }

        info!(
            pending = report.pending,
            approved = report.approved,
            skipped = report.skipped,
            "Legacy lists imported"
        );
        Ok(report)
    }
}

/// `ids` without duplicates or members of `exclude`, keeping first occurrences in order.
fn first_occurrences(ids: &[i64], exclude: &HashSet<i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| !exclude.contains(id) && seen.insert(*id))
        .collect()
}

/// A fresh record, or an `Inactive` one that was never moved.
async fn importable(store: &dyn StatusStore, identity: Identity) -> anyhow::Result<bool> {
    if store.create_if_absent(identity).await? {
        return Ok(true);
    }
    if store.get_status(identity).await? != Some(UserStatus::Inactive) {
        return Ok(false);
    }
    Ok(store.history(identity).await?.is_empty())
}
