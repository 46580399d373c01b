use anyhow::anyhow;

use crate::contract::model::{HistoryRecord, Identity, UserRecord, UserStatus};
use crate::infra::storage::entity::{users, users_hist};

fn status_from_row(user_id: i64, approved: bool, pending: bool) -> anyhow::Result<UserStatus> {
    UserStatus::from_flags(approved, pending)
        .ok_or_else(|| anyhow!("user {user_id} is stored as both approved and pending"))
}

/// Convert a `users` row to a contract record
pub fn user_to_contract(row: users::Model) -> anyhow::Result<UserRecord> {
    Ok(UserRecord {
        user_id: Identity(row.user_id),
        status: status_from_row(row.user_id, row.approved, row.pending)?,
        status_since: row.status_since,
    })
}

/// Convert a `users_hist` row to a contract record
pub fn history_to_contract(row: users_hist::Model) -> anyhow::Result<HistoryRecord> {
    Ok(HistoryRecord {
        sequence_id: row.sequence_id,
        user_id: Identity(row.user_id),
        previous: status_from_row(row.user_id, row.approved, row.pending)?,
        previous_since: row.status_since,
        changed_at: row.changed_at,
    })
}
