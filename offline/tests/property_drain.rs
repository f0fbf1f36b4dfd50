//! Properties 4 and 5: Drain removes only successes, with one aggregate
//! notification per outcome type.
//!
//! Three queued favorites; the backend accepts the first and third and
//! rejects the second. Afterwards only the second is queued, and clients
//! receive exactly one success (count 2) and one error (count 1).

mod common;

use common::MockScope;
use ev_offline::{
    Collection, NetworkError, NewRecord, Response, SyncEvent, SyncNotification, SyncOperation,
    SyncStatus,
};

/// Rejects favorites whose body carries id `fav-2`.
fn backend_rejecting_second() -> MockScope {
    MockScope::new(|request| {
        if request.url != "http://localhost/api/favorites" {
            return Ok(common::page("asset"));
        }
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().unwrap_or_default()).unwrap();
        if body["id"] == "fav-2" {
            Ok(Response::new(500))
        } else {
            Ok(Response::new(201))
        }
    })
}

fn queue_three_favorites() -> std::sync::Arc<ev_offline::OfflineQueue<ev_offline::MemoryBackend>> {
    let queue = common::memory_queue();
    for (id, station) in [("fav-1", "s1"), ("fav-2", "s2"), ("fav-3", "s3")] {
        queue
            .add_item(
                Collection::OfflineFavorites,
                NewRecord::favorite(station).with_id(id),
            )
            .unwrap();
    }
    queue
}

#[test]
fn only_failed_record_remains() {
    let queue = queue_three_favorites();
    let mut worker = common::active_worker(backend_rejecting_second(), queue.clone());

    let report = worker.handle_sync(&SyncEvent::new("sync-favorites")).unwrap();
    assert_eq!((report.attempted, report.succeeded, report.failed), (3, 2, 1));

    let remaining = queue.get_all_items(Collection::OfflineFavorites).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "fav-2");
}

#[test]
fn one_notification_per_outcome_type() {
    let queue = queue_three_favorites();
    let mut worker = common::active_worker(backend_rejecting_second(), queue);

    worker.handle_sync(&SyncEvent::new("sync-favorites"));

    let notifications = worker.scope().notifications();
    assert_eq!(notifications.len(), 2);
    assert_eq!(
        notifications[0],
        SyncNotification {
            status: SyncStatus::Success,
            operation: SyncOperation::Favorites,
            message: "Successfully synced 2 favorites".into(),
            count: Some(2),
        }
    );
    assert_eq!(
        notifications[1],
        SyncNotification {
            status: SyncStatus::Error,
            operation: SyncOperation::Favorites,
            message: "Failed to sync 1 favorites".into(),
            count: Some(1),
        }
    );
}

#[test]
fn every_window_gets_each_notification() {
    let scope = backend_rejecting_second().with_windows(&["tab-a", "tab-b", "tab-c"]);
    let mut worker = common::active_worker(scope, queue_three_favorites());

    worker.handle_sync(&SyncEvent::new("sync-favorites"));
    assert_eq!(worker.scope().posted.borrow().len(), 6);
}

#[test]
fn network_errors_count_as_failures() {
    let queue = common::memory_queue();
    for station in ["s1", "s2"] {
        queue
            .add_item(Collection::OfflineRatings, NewRecord::rating(station, 3, None))
            .unwrap();
    }
    let scope = MockScope::new(|request| {
        if request.url.ends_with("/api/ratings") {
            Err(NetworkError::Transport("connection reset".into()))
        } else {
            Ok(common::page("asset"))
        }
    });
    let mut worker = common::active_worker(scope, queue.clone());

    let report = worker.handle_sync(&SyncEvent::new("sync-ratings")).unwrap();
    assert_eq!((report.succeeded, report.failed), (0, 2));
    assert_eq!(
        worker.scope().notifications(),
        vec![SyncNotification::failed(SyncOperation::Ratings, 2)]
    );
    assert_eq!(queue.count(Collection::OfflineRatings).unwrap(), 2);
}

#[test]
fn empty_queue_is_silent() {
    let mut worker = common::active_worker(MockScope::site(), common::memory_queue());
    let report = worker.handle_sync(&SyncEvent::new("sync-ratings")).unwrap();
    assert_eq!(report.attempted, 0);
    assert!(worker.scope().posted.borrow().is_empty());
}

#[test]
fn ratings_and_favorites_drain_independently() {
    let queue = common::memory_queue();
    queue
        .add_item(Collection::OfflineRatings, NewRecord::rating("s1", 5, None))
        .unwrap();
    queue
        .add_item(Collection::OfflineFavorites, NewRecord::favorite("s1"))
        .unwrap();
    let mut worker = common::active_worker(
        MockScope::new(|_| Ok(Response::new(200))),
        queue.clone(),
    );

    worker.handle_sync(&SyncEvent::new("sync-ratings"));
    assert_eq!(queue.count(Collection::OfflineRatings).unwrap(), 0);
    assert_eq!(queue.count(Collection::OfflineFavorites).unwrap(), 1);
}

#[test]
fn records_added_mid_drain_wait_for_next_pass() {
    let queue = common::memory_queue();
    queue
        .add_item(
            Collection::OfflineFavorites,
            NewRecord::favorite("s1").with_id("fav-1"),
        )
        .unwrap();

    let late_writer = queue.clone();
    let added = std::cell::Cell::new(false);
    let scope = MockScope::new(move |request| {
        if request.url != "http://localhost/api/favorites" {
            return Ok(common::page("asset"));
        }
        if !added.replace(true) {
            late_writer
                .add_item(
                    Collection::OfflineFavorites,
                    NewRecord::favorite("s9").with_id("fav-late"),
                )
                .unwrap();
        }
        Ok(Response::new(201))
    });
    let mut worker = common::active_worker(scope, queue.clone());

    let report = worker.handle_sync(&SyncEvent::new("sync-favorites")).unwrap();
    assert_eq!((report.attempted, report.succeeded), (1, 1));
    let remaining: Vec<String> = queue
        .get_all_items(Collection::OfflineFavorites)
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(remaining, vec!["fav-late"]);

    let report = worker.handle_sync(&SyncEvent::new("sync-favorites")).unwrap();
    assert_eq!((report.attempted, report.succeeded), (1, 1));
    assert_eq!(queue.count(Collection::OfflineFavorites).unwrap(), 0);
}
