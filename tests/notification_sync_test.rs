//! Integration tests for the notification sync engine

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{citizen_session, settle_until, Gate, MockBackend, Scripted};
use ecocun::services::{MarkReadOutcome, RefreshOutcome};
use ecocun::{NotificationId, NotificationSyncEngine, SyncError};
use serde_json::json;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const POLL: Duration = Duration::from_secs(60);

fn feed() -> Vec<serde_json::Value> {
    vec![
        json!({"id": 1, "type": "success", "title": "Report approved",
               "message": "Your report #0042 was approved", "isRead": false,
               "createdAt": "2024-05-01T10:00:00Z"}),
        json!({"id": 2, "type": "reminder", "title": "Pending reports",
               "message": "3 reports await review", "isRead": false,
               "createdAt": "2024-05-01T09:00:00Z"}),
        json!({"id": 3, "type": "info", "title": "Welcome",
               "message": "Thanks for joining", "isRead": true,
               "readAt": "2024-04-30T08:00:00Z", "createdAt": "2024-04-30T07:00:00Z"}),
    ]
}

#[tokio::test]
async fn test_refresh_without_session_is_noop() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), None, POLL);

    let outcome = assert_ok!(engine.refresh().await);
    assert_eq!(outcome, RefreshOutcome::NoSession);
    assert_eq!(backend.notification_list_count(), 0);
    assert!(engine.notifications().is_empty());
}

#[tokio::test]
async fn test_refresh_merges_feed_in_order() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);

    let outcome = assert_ok!(engine.refresh().await);
    assert_eq!(outcome, RefreshOutcome::Applied { count: 3, unread: 2 });

    let ids: Vec<_> = engine.notifications().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NotificationId(1), NotificationId(2), NotificationId(3)]);
    assert!(engine.get(NotificationId(3)).unwrap().read_at.is_some());
    assert!(engine.get(NotificationId(1)).unwrap().read_at.is_none());
}

#[tokio::test]
async fn test_expired_session_leaves_list_untouched() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    assert_ok!(engine.refresh().await);
    let before = engine.notifications();

    backend.script_notifications(Scripted::err(SyncError::SessionExpired));
    let err = assert_err!(engine.refresh().await);
    assert_eq!(err, SyncError::SessionExpired);
    assert!(engine.is_session_expired());
    assert_eq!(engine.notifications(), before);
}

#[tokio::test]
async fn test_mark_read_sends_once() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    assert_ok!(engine.refresh().await);

    let first = assert_ok!(engine.mark_read(NotificationId(1)).await);
    assert_eq!(first, MarkReadOutcome::Confirmed);
    let second = assert_ok!(engine.mark_read(NotificationId(1)).await);
    assert_eq!(second, MarkReadOutcome::AlreadyRead);

    assert_eq!(backend.mark_read_count(), 1);
    assert_eq!(engine.unread_count(), 1);

    let err = assert_err!(engine.mark_read(NotificationId(99)).await);
    assert_eq!(err, SyncError::UnknownNotification(NotificationId(99)));
}

#[tokio::test]
async fn test_failed_mark_read_is_not_rolled_back() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    assert_ok!(engine.refresh().await);

    backend.script_mark_read(Scripted::err(SyncError::NetworkFailure(
        "unreachable".to_string(),
    )));
    let outcome = assert_ok!(engine.mark_read(NotificationId(2)).await);
    assert_eq!(outcome, MarkReadOutcome::Unconfirmed);

    let notification = engine.get(NotificationId(2)).unwrap();
    assert!(notification.is_read);
    assert!(notification.read_at.is_some());
}

#[tokio::test]
async fn test_local_read_survives_older_server_copy() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    assert_ok!(engine.refresh().await);

    // The server has not seen the read yet.
    backend.script_mark_read(Scripted::err(SyncError::NetworkFailure(
        "timeout".to_string(),
    )));
    assert_ok!(engine.mark_read(NotificationId(1)).await);

    assert_ok!(engine.refresh().await);
    assert!(engine.get(NotificationId(1)).unwrap().is_read);
    assert_eq!(engine.unread_count(), 1);
}

#[tokio::test]
async fn test_newer_server_copy_wins() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    assert_ok!(engine.refresh().await);
    assert_ok!(engine.mark_read(NotificationId(1)).await);

    // Marked unread again on the server after our local read.
    let later = (Utc::now() + ChronoDuration::minutes(5)).to_rfc3339();
    backend.set_notifications(vec![json!({
        "id": 1, "type": "success", "title": "Report approved",
        "message": "Your report #0042 was approved", "isRead": false,
        "createdAt": "2024-05-01T10:00:00Z", "updatedAt": later
    })]);

    let outcome = assert_ok!(engine.refresh().await);
    assert_eq!(outcome, RefreshOutcome::Applied { count: 1, unread: 1 });
    assert!(!engine.get(NotificationId(1)).unwrap().is_read);
}

#[tokio::test]
async fn test_unread_count_is_published() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    let rx = engine.subscribe_unread();
    assert_eq!(*rx.borrow(), 0);

    assert_ok!(engine.refresh().await);
    assert_eq!(*rx.borrow(), 2);

    assert_ok!(engine.mark_read(NotificationId(2)).await);
    assert_eq!(*rx.borrow(), 1);

    engine.set_session(None);
    assert_eq!(*rx.borrow(), 0);
    assert!(engine.notifications().is_empty());
}

#[tokio::test]
async fn test_session_change_discards_outstanding_fetch() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);

    let gate = Gate::new();
    backend.script_notifications(Scripted::ok(vec![]).gated(&gate));

    let refresh = tokio::spawn({
        let engine = engine.clone();
        async move { engine.refresh().await }
    });
    settle_until(|| backend.notification_list_count() == 1).await;

    engine.set_session(Some(citizen_session(8)));
    gate.open();

    let outcome = assert_ok!(refresh.await.unwrap());
    assert_eq!(outcome, RefreshOutcome::Discarded);
}

#[tokio::test(start_paused = true)]
async fn test_polling_runs_until_deactivated() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);

    let handle = engine.activate();
    assert!(handle.is_active());

    // First tick fires immediately.
    settle_until(|| backend.notification_list_count() == 1).await;
    assert_eq!(engine.unread_count(), 2);

    tokio::time::advance(POLL).await;
    settle_until(|| backend.notification_list_count() == 2).await;

    tokio::time::advance(POLL).await;
    settle_until(|| backend.notification_list_count() == 3).await;

    handle.deactivate();
    tokio::time::advance(POLL * 3).await;
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.notification_list_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handle_ignores_late_response() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);

    let gate = Gate::new();
    backend.script_notifications(Scripted::ok(vec![]).gated(&gate));

    let handle = engine.activate();
    settle_until(|| backend.notification_list_count() == 1).await;
    drop(handle);
    gate.open();

    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert!(engine.notifications().is_empty());
    assert_eq!(*engine.subscribe_unread().borrow(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_on_expired_session() {
    let backend = MockBackend::with_notifications(feed());
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    backend.script_notifications(Scripted::err(SyncError::SessionExpired));

    let handle = engine.activate();
    settle_until(|| !handle.is_active()).await;
    assert!(engine.is_session_expired());

    tokio::time::advance(POLL * 2).await;
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.notification_list_count(), 1);
}

#[tokio::test]
async fn test_unstamped_feed_does_not_revert_local_read() {
    let backend = MockBackend::with_notifications(vec![
        json!({"id": 1, "type": "info", "isRead": false}),
    ]);
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);
    assert_ok!(engine.refresh().await);

    backend.script_mark_read(Scripted::err(SyncError::NetworkFailure(
        "unreachable".to_string(),
    )));
    let outcome = assert_ok!(engine.mark_read(NotificationId(1)).await);
    assert_eq!(outcome, MarkReadOutcome::Unconfirmed);
    let read_at = engine.get(NotificationId(1)).unwrap().read_at;

    // The server has not caught up and sends no timestamps.
    let outcome = assert_ok!(engine.refresh().await);
    assert_eq!(outcome, RefreshOutcome::Applied { count: 1, unread: 0 });

    let notification = engine.get(NotificationId(1)).unwrap();
    assert!(notification.is_read);
    assert_eq!(notification.read_at, read_at);
    assert!(read_at.is_some());
}

#[tokio::test]
async fn test_mistyped_feed_items_are_kept() {
    let backend = MockBackend::with_notifications(vec![
        json!({"id": 1, "isRead": false}),
        json!({"id": 2, "isRead": null, "createdAt": 1700000000, "title": 9}),
    ]);
    let engine = NotificationSyncEngine::new(backend.clone(), Some(citizen_session(7)), POLL);

    let outcome = assert_ok!(engine.refresh().await);
    assert_eq!(outcome, RefreshOutcome::Applied { count: 2, unread: 2 });
    assert_eq!(engine.get(NotificationId(2)).unwrap().title, "9");
}
