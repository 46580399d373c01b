use async_trait::async_trait;

use crate::contract::model::{HistoryRecord, Identity, UserRecord, UserStatus};

/// Result of a status change attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The change was written together with a history snapshot of `previous`.
    Applied { previous: UserStatus },
    /// The guard did not hold; nothing was written.
    Skipped { current: UserStatus },
    /// No record exists for the user.
    Missing,
}

/// Port for the domain layer: the durable status store.
/// Object-safe and async-friendly via `async_trait`.
///
/// Every status change appends exactly one history snapshot of the prior
/// status, and both writes become visible together or not at all.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Load the current record for a user.
    async fn find(&self, user_id: Identity) -> anyhow::Result<Option<UserRecord>>;

    /// Current status only; `None` when the user has never been seen.
    async fn get_status(&self, user_id: Identity) -> anyhow::Result<Option<UserStatus>> {
        Ok(self.find(user_id).await?.map(|r| r.status))
    }

    /// Insert an `Inactive` record if none exists. Returns true if a row was created.
    async fn create_if_absent(&self, user_id: Identity) -> anyhow::Result<bool>;

    /// Unconditionally move the user to `to`, recording the prior status.
    async fn transition(&self, user_id: Identity, to: UserStatus)
        -> anyhow::Result<TransitionOutcome>;

    /// Move the user from `from` to `to` only if the stored status equals `from`
    /// at the moment of the write. Exactly one of several racing callers wins.
    async fn transition_from(
        &self,
        user_id: Identity,
        from: UserStatus,
        to: UserStatus,
    ) -> anyhow::Result<TransitionOutcome>;

    /// Pending identities ordered by request time (oldest first, ties by id),
    /// plus the total number of pending users. An offset at or past the total
    /// yields an empty slice without touching the rows.
    async fn list_pending(&self, offset: u64, limit: u64) -> anyhow::Result<(Vec<Identity>, u64)>;

    /// History snapshots of a user in write order.
    async fn history(&self, user_id: Identity) -> anyhow::Result<Vec<HistoryRecord>>;
}
