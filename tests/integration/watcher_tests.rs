//! Poll loop behavior: diffing, persistence-before-notification, failure
//! isolation and cancellation

use crate::common::{crawler, listing, set, MemoryStore, RecordingNotifier};
use neagent_watch::notify::{FileNotifier, Notifier, TIMESTAMP_FORMAT};
use neagent_watch::storage::{LinkStore, SqliteLinkStore};
use neagent_watch::watcher::{CycleError, Watcher};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOUR: Duration = Duration::from_secs(3600);

/// Serves the three-page listing from the reference scenario
async fn three_page_site() -> (MockServer, String) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/1", "/item/2"])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/3"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&["?page=2", "?page=3"], &["/item/1"])),
        )
        .mount(&server)
        .await;

    let source = format!("{}/board/", server.uri());
    (server, source)
}

async fn failing_site() -> (MockServer, String) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let source = format!("{}/board/", server.uri());
    (server, source)
}

#[tokio::test]
async fn test_reference_scenario_with_sqlite_and_file() {
    let (_server, source) = three_page_site().await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("neagent.txt");

    let store = Arc::new(SqliteLinkStore::new(dir.path().join("neagent.db")));
    store.ensure_schema().unwrap();
    store.record_seen(&source, &set(&["/item/1"])).unwrap();

    let notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(FileNotifier::new(&out))];
    let watcher = Watcher::new(&source, HOUR, crawler(), store.clone(), notifiers);
    watcher.prepare().unwrap();

    let first = watcher.run_cycle().await.expect("First cycle failed");
    assert_eq!(first.candidates, 3);
    assert_eq!(first.new_links, vec!["/item/2", "/item/3"]);
    assert_eq!(first.recorded, 2);
    assert!(first.dispatch.unwrap().all_delivered());

    let second = watcher.run_cycle().await.expect("Second cycle failed");
    assert_eq!(second.candidates, 3);
    assert!(second.new_links.is_empty());
    assert_eq!(second.recorded, 0);

    let seen: Vec<String> = store
        .seen_links(&source)
        .unwrap()
        .into_iter()
        .map(|r| r.item_link)
        .collect();
    assert_eq!(seen, vec!["/item/1", "/item/2", "/item/3"]);

    // First entry lists the new links, second is a bare timestamp
    let content = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], first.timestamp);
    assert_eq!(&lines[1..3], &["/item/2", "/item/3"]);
    assert_eq!(lines[3], second.timestamp);
    assert!(chrono::NaiveDateTime::parse_from_str(lines[0], TIMESTAMP_FORMAT).is_ok());
}

#[tokio::test]
async fn test_base_page_failure_skips_store_and_notifiers() {
    let (_server, source) = failing_site().await;
    let store = MemoryStore::new();
    let (notifier, messages) = RecordingNotifier::new("recorder", false);

    let watcher = Watcher::new(&source, HOUR, crawler(), store.clone(), vec![notifier]);

    let err = watcher.run_cycle().await.unwrap_err();

    assert!(matches!(err, CycleError::Crawl { .. }));
    assert_eq!(err.phase(), "crawl");
    assert_eq!(store.filter_calls(), 0);
    assert_eq!(store.record_calls(), 0);
    assert!(messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failing_notifier_does_not_block_others() {
    let (_server, source) = three_page_site().await;
    let store = MemoryStore::new();
    let (first, first_msgs) = RecordingNotifier::new("first", false);
    let (second, second_msgs) = RecordingNotifier::new("second", true);
    let (third, third_msgs) = RecordingNotifier::new("third", false);

    let watcher = Watcher::new(
        &source,
        HOUR,
        crawler(),
        store.clone(),
        vec![first, second, third],
    );

    let report = watcher.run_cycle().await.expect("Cycle failed");

    let expected = vec!["/item/1\n/item/2\n/item/3".to_string()];
    assert_eq!(*first_msgs.lock().unwrap(), expected);
    assert_eq!(*second_msgs.lock().unwrap(), expected);
    assert_eq!(*third_msgs.lock().unwrap(), expected);

    let dispatch = report.dispatch.unwrap();
    assert_eq!(dispatch.delivered, vec!["first", "third"]);
    assert_eq!(dispatch.failed.len(), 1);

    // Persistence is authoritative even though a notifier failed
    assert_eq!(store.seen_for(&source), set(&["/item/1", "/item/2", "/item/3"]));
}

#[tokio::test]
async fn test_record_failure_means_no_notification() {
    let (_server, source) = three_page_site().await;
    let store = MemoryStore::new();
    store
        .fail_record
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let (notifier, messages) = RecordingNotifier::new("recorder", false);

    let watcher = Watcher::new(&source, HOUR, crawler(), store.clone(), vec![notifier]);

    let err = watcher.run_cycle().await.unwrap_err();

    assert_eq!(err.phase(), "record");
    assert_eq!(store.filter_calls(), 1);
    assert!(messages.lock().unwrap().is_empty());

    // Store recovers: the same links are still new on the next cycle
    store
        .fail_record
        .store(false, std::sync::atomic::Ordering::SeqCst);
    let report = watcher.run_cycle().await.expect("Cycle failed");
    assert_eq!(report.new_links.len(), 3);
    assert_eq!(messages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_batch_notification_is_configurable() {
    let (_server, source) = three_page_site().await;
    let store = MemoryStore::new();
    let (notifier, messages) = RecordingNotifier::new("recorder", false);

    let watcher = Watcher::new(&source, HOUR, crawler(), store.clone(), vec![notifier])
        .with_notify_empty(false);

    watcher.run_cycle().await.unwrap();
    let quiet = watcher.run_cycle().await.unwrap();

    assert!(quiet.new_links.is_empty());
    assert!(quiet.dispatch.is_none());
    assert_eq!(messages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_batch_still_notifies_by_default() {
    let (_server, source) = three_page_site().await;
    let store = MemoryStore::new();
    let (notifier, messages) = RecordingNotifier::new("recorder", false);

    let watcher = Watcher::new(&source, HOUR, crawler(), store.clone(), vec![notifier]);

    watcher.run_cycle().await.unwrap();
    watcher.run_cycle().await.unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1], "");
}

#[tokio::test]
async fn test_loop_survives_failing_cycles_until_cancelled() {
    let (_server, source) = three_page_site().await;
    let store = MemoryStore::new();
    store
        .fail_filter
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let watcher = Watcher::new(
        &source,
        Duration::from_millis(20),
        crawler(),
        store.clone(),
        Vec::new(),
    );

    let shutdown = CancellationToken::new();
    let canceller = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    watcher.run(shutdown).await.expect("Loop should stop cleanly");

    assert!(store.filter_calls() >= 2, "loop should keep polling after errors");
    assert_eq!(store.record_calls(), 0);
}

#[tokio::test]
async fn test_cancellation_interrupts_sleep() {
    let (_server, source) = three_page_site().await;
    let store = MemoryStore::new();

    let watcher = Watcher::new(&source, HOUR, crawler(), store.clone(), Vec::new());

    let shutdown = CancellationToken::new();
    let canceller = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    tokio::time::timeout(Duration::from_secs(10), watcher.run(shutdown))
        .await
        .expect("Cancellation should end the hour-long sleep")
        .unwrap();

    assert_eq!(store.filter_calls(), 1);
    assert_eq!(store.seen_for(&source).len(), 3);
}

#[tokio::test]
async fn test_cancelled_before_start_runs_no_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/1"])))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let watcher = Watcher::new(
        format!("{}/board/", server.uri()),
        HOUR,
        crawler(),
        store.clone(),
        Vec::new(),
    );

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    watcher.run(shutdown).await.unwrap();

    assert_eq!(store.filter_calls(), 0);
}

#[tokio::test]
async fn test_unusable_store_fails_startup() {
    let (_server, source) = three_page_site().await;
    let store = Arc::new(SqliteLinkStore::new("/nonexistent-dir/deeper/neagent.db"));

    let watcher = Watcher::new(&source, HOUR, crawler(), store, Vec::new());

    let result = watcher.run(CancellationToken::new()).await;
    assert!(result.is_err());
}
