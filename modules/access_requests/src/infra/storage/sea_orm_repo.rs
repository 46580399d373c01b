//! SeaORM-backed status store for the domain port.
//!
//! Generic over the connection type so tests can hand in any SeaORM
//! connection; every operation that writes opens its own transaction.
//!
//! A transition starts with the history insert (`INSERT .. SELECT .. FOR UPDATE`),
//! so the first statement of the transaction takes the row lock on PostgreSQL
//! and the database write lock on SQLite before the snapshot is read. The
//! guard in the `WHERE` clause is therefore evaluated against the latest
//! committed status, and racing callers serialize on that lock.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::contract::model::{HistoryRecord, Identity, UserRecord, UserStatus};
use crate::domain::repo::{StatusStore, TransitionOutcome};
use crate::infra::storage::entity::{users, users_hist};
use crate::infra::storage::mapper::{history_to_contract, user_to_contract};

/// SeaORM status store impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmStatusStore<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmStatusStore<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn apply(
        &self,
        user_id: Identity,
        guard: Option<UserStatus>,
        to: UserStatus,
    ) -> anyhow::Result<TransitionOutcome> {
        let now: DateTime<Utc> = Utc::now();
        let txn = self.conn.begin().await.context("begin transition failed")?;
        let backend = txn.get_database_backend();

        let mut snapshot = Query::select();
        snapshot
            .column(users::Column::UserId)
            .column(users::Column::Approved)
            .column(users::Column::Pending)
            .column(users::Column::StatusSince)
            .expr(Expr::value(now))
            .from(users::Entity)
            .and_where(users::Column::UserId.eq(user_id.get()));
        if let Some(from) = guard {
            snapshot
                .and_where(users::Column::Approved.eq(from.approved()))
                .and_where(users::Column::Pending.eq(from.pending()));
        }
        snapshot.lock_exclusive();

        let mut append = Query::insert();
        append
            .into_table(users_hist::Entity)
            .columns([
                users_hist::Column::UserId,
                users_hist::Column::Approved,
                users_hist::Column::Pending,
                users_hist::Column::StatusSince,
                users_hist::Column::ChangedAt,
            ])
            .select_from(snapshot)
            .context("build history snapshot failed")?;

        let appended = txn
            .execute(backend.build(&append))
            .await
            .context("append history failed")?
            .rows_affected();

        let row = users::Entity::find_by_id(user_id.get())
            .one(&txn)
            .await
            .context("load user in transition failed")?;

        let Some(row) = row else {
            txn.rollback().await.context("rollback failed")?;
            return Ok(TransitionOutcome::Missing);
        };
        let current = user_to_contract(row)?.status;

        if appended == 0 {
            txn.rollback().await.context("rollback failed")?;
            return Ok(TransitionOutcome::Skipped { current });
        }

        users::Entity::update_many()
            .col_expr(users::Column::Approved, Expr::value(to.approved()))
            .col_expr(users::Column::Pending, Expr::value(to.pending()))
            .col_expr(users::Column::StatusSince, Expr::value(now))
            .filter(users::Column::UserId.eq(user_id.get()))
            .exec(&txn)
            .await
            .context("update status failed")?;

        txn.commit().await.context("commit transition failed")?;
        Ok(TransitionOutcome::Applied { previous: current })
    }
}

#[async_trait::async_trait]
impl<C> StatusStore for SeaOrmStatusStore<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find(&self, user_id: Identity) -> anyhow::Result<Option<UserRecord>> {
        let found = users::Entity::find_by_id(user_id.get())
            .one(&self.conn)
            .await
            .context("find failed")?;
        found.map(user_to_contract).transpose()
    }

    async fn create_if_absent(&self, user_id: Identity) -> anyhow::Result<bool> {
        let row = users::ActiveModel {
            user_id: Set(user_id.get()),
            approved: Set(false),
            pending: Set(false),
            status_since: Set(Utc::now()),
        };
        let inserted = users::Entity::insert(row)
            .on_conflict(
                OnConflict::column(users::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("create_if_absent failed")?;
        Ok(inserted > 0)
    }

    async fn transition(
        &self,
        user_id: Identity,
        to: UserStatus,
    ) -> anyhow::Result<TransitionOutcome> {
        self.apply(user_id, None, to).await
    }

    async fn transition_from(
        &self,
        user_id: Identity,
        from: UserStatus,
        to: UserStatus,
    ) -> anyhow::Result<TransitionOutcome> {
        self.apply(user_id, Some(from), to).await
    }

    async fn list_pending(&self, offset: u64, limit: u64) -> anyhow::Result<(Vec<Identity>, u64)> {
        let pending = users::Entity::find().filter(users::Column::Pending.eq(true));

        let total = pending
            .clone()
            .count(&self.conn)
            .await
            .context("count pending failed")?;
        if offset >= total {
            return Ok((Vec::new(), total));
        }

        let rows = pending
            .order_by_asc(users::Column::StatusSince)
            .order_by_asc(users::Column::UserId)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("list pending failed")?;

        Ok((rows.into_iter().map(|r| Identity(r.user_id)).collect(), total))
    }

    async fn history(&self, user_id: Identity) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = users_hist::Entity::find()
            .filter(users_hist::Column::UserId.eq(user_id.get()))
            .order_by_asc(users_hist::Column::SequenceId)
            .all(&self.conn)
            .await
            .context("history failed")?;
        rows.into_iter().map(history_to_contract).collect()
    }
}
