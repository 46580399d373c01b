//! Status store semantics: atomic transitions, guards, history and concurrency.

mod common;

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use access_requests::contract::model::{Identity, UserStatus};
use access_requests::domain::repo::{StatusStore, TransitionOutcome};
use access_requests::infra::legacy::{ImportReport, LegacyLists};
use access_requests::AccessRequests;
use common::{file_db, memory_db};

#[tokio::test]
async fn create_if_absent_only_creates_once() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());

    assert!(store.create_if_absent(Identity(1)).await.unwrap());
    assert!(!store.create_if_absent(Identity(1)).await.unwrap());

    let record = store.find(Identity(1)).await.unwrap().unwrap();
    assert_eq!(record.status, UserStatus::Inactive);
    assert!(store.history(Identity(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_user_has_no_status() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    assert_eq!(store.get_status(Identity(5)).await.unwrap(), None);
    assert_eq!(
        store
            .transition(Identity(5), UserStatus::Pending)
            .await
            .unwrap(),
        TransitionOutcome::Missing
    );
    assert_eq!(
        store
            .transition_from(Identity(5), UserStatus::Inactive, UserStatus::Pending)
            .await
            .unwrap(),
        TransitionOutcome::Missing
    );
    assert!(store.history(Identity(5)).await.unwrap().is_empty());
}

#[tokio::test]
async fn transition_snapshots_previous_status() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    store.create_if_absent(Identity(1)).await.unwrap();
    let created = store.find(Identity(1)).await.unwrap().unwrap();

    let outcome = store
        .transition(Identity(1), UserStatus::Approved)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TransitionOutcome::Applied {
            previous: UserStatus::Inactive
        }
    );

    let after = store.find(Identity(1)).await.unwrap().unwrap();
    assert_eq!(after.status, UserStatus::Approved);
    assert!(after.status_since >= created.status_since);

    let history = store.history(Identity(1)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_id, Identity(1));
    assert_eq!(history[0].previous, UserStatus::Inactive);
    assert_eq!(history[0].previous_since, created.status_since);
    assert_eq!(history[0].changed_at, after.status_since);
}

#[tokio::test]
async fn guarded_transition_skips_without_history() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    store.create_if_absent(Identity(1)).await.unwrap();

    let outcome = store
        .transition_from(Identity(1), UserStatus::Pending, UserStatus::Approved)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TransitionOutcome::Skipped {
            current: UserStatus::Inactive
        }
    );
    assert_eq!(
        store.get_status(Identity(1)).await.unwrap(),
        Some(UserStatus::Inactive)
    );
    assert!(store.history(Identity(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_sequence_is_monotonic_across_users() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    for id in [1, 2] {
        store.create_if_absent(Identity(id)).await.unwrap();
    }
    store.transition(Identity(1), UserStatus::Pending).await.unwrap();
    store.transition(Identity(2), UserStatus::Pending).await.unwrap();
    store.transition(Identity(1), UserStatus::Approved).await.unwrap();

    let h1 = store.history(Identity(1)).await.unwrap();
    let h2 = store.history(Identity(2)).await.unwrap();
    assert_eq!(h1.len(), 2);
    assert!(h1[0].sequence_id < h2[0].sequence_id);
    assert!(h2[0].sequence_id < h1[1].sequence_id);
    assert_eq!(h1[1].previous, UserStatus::Pending);
}

#[tokio::test]
async fn list_pending_pages_in_request_order() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    for id in [3, 1, 2] {
        store.create_if_absent(Identity(id)).await.unwrap();
        store.transition(Identity(id), UserStatus::Pending).await.unwrap();
    }
    store.create_if_absent(Identity(9)).await.unwrap();

    let (first, total) = store.list_pending(0, 2).await.unwrap();
    assert_eq!(first, vec![Identity(3), Identity(1)]);
    assert_eq!(total, 3);

    let (rest, total) = store.list_pending(2, 2).await.unwrap();
    assert_eq!(rest, vec![Identity(2)]);
    assert_eq!(total, 3);

    let (beyond, total) = store.list_pending(10, 2).await.unwrap();
    assert!(beyond.is_empty());
    assert_eq!(total, 3);
}

#[tokio::test]
async fn schema_rejects_approved_and_pending_together() {
    let db = memory_db().await;
    let res = db
        .sea()
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "INSERT INTO users (user_id, approved, pending, status_since) \
             VALUES (1, 1, 1, '2024-01-01T00:00:00+00:00')",
        ))
        .await;
    assert!(res.is_err(), "CHECK constraint must reject both flags set");
}

#[tokio::test]
async fn concurrent_approvals_apply_once() {
    let (db, _dir) = file_db().await;
    let store = AccessRequests::status_store(db.sea());
    store.create_if_absent(Identity(42)).await.unwrap();
    store.transition(Identity(42), UserStatus::Pending).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store
                .transition_from(Identity(42), UserStatus::Pending, UserStatus::Approved)
                .await
        }));
    }

    let mut applied = 0;
    let mut skipped = 0;
    for task in tasks {
        match task.await.unwrap().unwrap() {
            TransitionOutcome::Applied { previous } => {
                assert_eq!(previous, UserStatus::Pending);
                applied += 1;
            }
            TransitionOutcome::Skipped { current } => {
                assert_eq!(current, UserStatus::Approved);
                skipped += 1;
            }
            TransitionOutcome::Missing => panic!("record vanished"),
        }
    }
    assert_eq!(applied, 1);
    assert_eq!(skipped, 7);

    // inactive -> pending, pending -> approved
    assert_eq!(store.history(Identity(42)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_registrations_submit_once() {
    let (db, _dir) = file_db().await;
    let store = AccessRequests::status_store(db.sea());

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store.create_if_absent(Identity(7)).await?;
            store
                .transition_from(Identity(7), UserStatus::Inactive, UserStatus::Pending)
                .await
        }));
    }
    let mut applied = 0;
    for task in tasks {
        if matches!(
            task.await.unwrap().unwrap(),
            TransitionOutcome::Applied { .. }
        ) {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);
    assert_eq!(store.history(Identity(7)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn legacy_import_seeds_unknown_users_only() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    store.create_if_absent(Identity(3)).await.unwrap();
    store.transition(Identity(3), UserStatus::Approved).await.unwrap();

    let lists = LegacyLists {
        pending: vec![1, 2, 3, 4, -1],
        approved: vec![4, 5],
    };
    let report = lists.import_into(store.as_ref()).await.unwrap();
    assert_eq!(
        report,
        ImportReport {
            pending: 2,
            approved: 2,
            skipped: 2,
        }
    );

    assert_eq!(store.get_status(Identity(1)).await.unwrap(), Some(UserStatus::Pending));
    assert_eq!(store.get_status(Identity(3)).await.unwrap(), Some(UserStatus::Approved));
    assert_eq!(store.get_status(Identity(4)).await.unwrap(), Some(UserStatus::Approved));
    assert_eq!(store.get_status(Identity(5)).await.unwrap(), Some(UserStatus::Approved));
    assert_eq!(store.history(Identity(5)).await.unwrap().len(), 1);
    assert_eq!(store.history(Identity(3)).await.unwrap().len(), 1);

    // Second run changes nothing
    let again = lists.import_into(store.as_ref()).await.unwrap();
    assert_eq!(again.pending + again.approved, 0);
}

#[tokio::test]
async fn legacy_import_keeps_file_order() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());

    let lists = LegacyLists {
        pending: vec![30, 10, 30, 20, 40],
        approved: vec![40],
    };
    let report = lists.import_into(store.as_ref()).await.unwrap();
    assert_eq!(report.pending, 3);
    assert_eq!(report.approved, 1);

    let (queue, total) = store.list_pending(0, 10).await.unwrap();
    assert_eq!(queue, vec![Identity(30), Identity(10), Identity(20)]);
    assert_eq!(total, 3);
}

#[tokio::test]
async fn legacy_import_promotes_record_left_without_history() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    // What an interrupted import leaves behind
    store.create_if_absent(Identity(6)).await.unwrap();
    store.create_if_absent(Identity(7)).await.unwrap();

    let lists = LegacyLists {
        pending: vec![6],
        approved: vec![7],
    };
    let report = lists.import_into(store.as_ref()).await.unwrap();
    assert_eq!(
        report,
        ImportReport {
            pending: 1,
            approved: 1,
            skipped: 0,
        }
    );
    assert_eq!(store.get_status(Identity(6)).await.unwrap(), Some(UserStatus::Pending));
    assert_eq!(store.get_status(Identity(7)).await.unwrap(), Some(UserStatus::Approved));

    let history = store.history(Identity(6)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous, UserStatus::Inactive);
}

#[tokio::test]
async fn list_pending_offset_beyond_total_is_empty() {
    let db = memory_db().await;
    let store = AccessRequests::status_store(db.sea());
    store.create_if_absent(Identity(1)).await.unwrap();
    store.transition(Identity(1), UserStatus::Pending).await.unwrap();

    for offset in [1, i64::MAX as u64, u64::MAX] {
        let (items, total) = store.list_pending(offset, 10).await.unwrap();
        assert!(items.is_empty(), "offset {offset}");
        assert_eq!(total, 1);
    }
}
