//! Client Library Tests (floattime-client)
//!
//! Tests for the Ontime client against a mock server:
//! - Connection lifecycle (start, stop, restart, server close)
//! - Update delivery and consumer isolation
//! - Control command wire shapes
//! - Reachability probe

use floattime_client::{probe, probe_blocking, ClientError, ConnectionState, OntimeClient};
use floattime_core::TimerType;
use floattime_test_utils::{wait_for, MockHttp, MockOntime, TimerCollector, DEFAULT_TIMEOUT};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const SHORT: Duration = Duration::from_millis(300);

async fn connected_client(server: &MockOntime, collector: &TimerCollector) -> OntimeClient {
    let client = OntimeClient::builder()
        .on_update(collector.callback())
        .start(&server.url())
        .await
        .expect("start failed");

    client
        .wait_until_connected(DEFAULT_TIMEOUT)
        .await
        .expect("never connected");
    client
}

// ============================================================================
// Connection Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_connect_sends_initial_poll() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    assert!(client.is_connected());
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.url(), Some(server.ws_url()));
    assert_eq!(server.paths(), vec!["/ws".to_string()]);

    assert!(server.wait_for_received(1, DEFAULT_TIMEOUT).await);
    assert_eq!(server.received_json()[0], json!({"tag": "poll"}));

    client.stop().await;
}

#[tokio::test]
async fn test_poll_on_connect_disabled() {
    let server = MockOntime::start().await;
    let client = OntimeClient::builder()
        .poll_on_connect(false)
        .start(&server.url())
        .await
        .unwrap();
    client.wait_until_connected(DEFAULT_TIMEOUT).await.unwrap();

    assert!(client.start_timer());
    assert!(server.wait_for_received(1, DEFAULT_TIMEOUT).await);
    assert_eq!(server.received_json(), vec![json!({"tag": "start"})]);

    client.stop().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    client.stop().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(!client.is_connected());
    assert!(client.url().is_none());

    client.stop().await;
    assert_eq!(client.state(), ConnectionState::Closed);

    // Commands after stop are dropped
    assert!(!client.pause_timer());
}

#[tokio::test]
async fn test_restart_after_stop() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    client.stop().await;
    client.start(&server.url()).await.unwrap();
    client.wait_until_connected(DEFAULT_TIMEOUT).await.unwrap();

    assert!(server.wait_for_connections(2, DEFAULT_TIMEOUT).await);
    assert!(client.is_connected());

    client.stop().await;
}

#[tokio::test]
async fn test_start_same_url_keeps_session() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    client.start(&server.url()).await.unwrap();
    client.start(&format!("{}/", server.url())).await.unwrap();

    tokio::time::sleep(SHORT).await;
    assert_eq!(server.connections(), 1);
    assert!(client.is_connected());

    client.stop().await;
}

#[tokio::test]
async fn test_server_close_marks_closed() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    server.close_clients();

    let client_ref = &client;
    let closed = wait_for(
        move || async move { client_ref.state() == ConnectionState::Closed },
        Duration::from_millis(10),
        DEFAULT_TIMEOUT,
    )
    .await;
    assert!(closed, "client never noticed the close");
    assert!(!client.is_connected());
    assert!(!client.reload_timer());
    assert!(client.current_event().is_none());
}

#[tokio::test]
async fn test_connect_failure_reported() {
    // Reserve a port, then free it so nothing listens there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = OntimeClient::new();
    client
        .start(&format!("http://127.0.0.1:{}", port))
        .await
        .unwrap();

    let result = client.wait_until_connected(DEFAULT_TIMEOUT).await;
    assert!(matches!(result, Err(ClientError::ConnectionFailed(_))));
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_invalid_url_rejected() {
    let client = OntimeClient::new();
    for url in ["", "ftp://host", "http://"] {
        assert!(client.start(url).await.is_err(), "accepted {:?}", url);
    }
    assert_eq!(client.state(), ConnectionState::Idle);
}

// ============================================================================
// Update Delivery Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_update() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    server.push(json!({
        "timer": {"current": 59000, "playback": "play"},
        "eventNow": {"id": "1", "title": "Intro", "duration": 60000}
    }));

    assert!(collector.wait_for_count(1, DEFAULT_TIMEOUT).await);
    let data = collector.last().unwrap();
    assert_eq!(data.timer_ms, Some(59_000));
    assert_eq!(data.timer_type, TimerType::CountDown);
    assert_eq!(data.title, "Intro");
    assert_eq!(data.duration, Some(60_000));
    assert!(data.running);

    client.stop().await;
}

#[tokio::test]
async fn test_tagged_frames_unwrapped_in_order() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    server.push(json!({"tag": "ontime", "payload": {"timer": {"current": 3000}}}));
    server.push(json!({"type": "ontime-timer", "payload": {"timer": {"current": 2000}}}));
    server.push(json!({"timer": {"current": 1000}}));

    assert!(collector.wait_for_count(3, DEFAULT_TIMEOUT).await);
    let values: Vec<_> = collector.values().iter().map(|d| d.timer_ms).collect();
    assert_eq!(values, vec![Some(3000), Some(2000), Some(1000)]);

    client.stop().await;
}

#[tokio::test]
async fn test_bad_frames_and_heartbeats_not_delivered() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    server.push_text("{ not json");
    server.push_text("42");
    server.push(json!({"clock": "12:00:00"}));
    server.push(json!({"timer": {"current": 5000}}));

    assert!(collector.wait_for_count(1, DEFAULT_TIMEOUT).await);
    tokio::time::sleep(SHORT).await;
    assert_eq!(collector.count(), 1);
    assert_eq!(collector.last().unwrap().timer_ms, Some(5000));
    assert!(client.is_connected());

    client.stop().await;
}

#[tokio::test]
async fn test_message_only_frame_merges() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    server.push(json!({
        "timer": {"current": 30000, "playback": "play"},
        "eventNow": {"id": "e1", "title": "Panel", "duration": 60000},
        "message": {"timer": {"blink": false}}
    }));
    server.push(json!({"message": {"timer": {"blink": true}}}));

    assert!(collector.wait_for_count(2, DEFAULT_TIMEOUT).await);
    let values = collector.values();
    let (full, merged) = (&values[0], &values[1]);
    assert!(!full.blink);
    assert!(merged.blink);
    assert_eq!(merged, &full.with_display_flags(true, full.blackout));

    client.stop().await;
}

#[tokio::test]
async fn test_panicking_callback_keeps_connection() {
    let server = MockOntime::start().await;
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();

    let client = OntimeClient::builder()
        .on_update(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("consumer bug");
            }
        })
        .start(&server.url())
        .await
        .unwrap();
    client.wait_until_connected(DEFAULT_TIMEOUT).await.unwrap();

    server.push(json!({"timer": {"current": 2000}}));
    server.push(json!({"timer": {"current": 1000}}));

    let counter = calls.as_ref();
    let delivered = wait_for(
        move || async move { counter.load(Ordering::SeqCst) >= 2 },
        Duration::from_millis(10),
        DEFAULT_TIMEOUT,
    )
    .await;
    assert!(delivered, "second update never arrived");
    assert!(client.is_connected());

    client.stop().await;
}

#[tokio::test]
async fn test_callback_registered_after_start() {
    let server = MockOntime::start().await;
    let client = OntimeClient::new();
    client.start(&server.url()).await.unwrap();
    client.wait_until_connected(DEFAULT_TIMEOUT).await.unwrap();

    let collector = TimerCollector::new();
    client.on_update(collector.callback());

    server.push(json!({"timer": {"current": 1000}}));
    assert!(collector.wait_for_count(1, DEFAULT_TIMEOUT).await);

    client.stop().await;
}

// ============================================================================
// Command Tests
// ============================================================================

#[tokio::test]
async fn test_commands_reach_server() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    assert!(client.start_timer());
    assert!(client.pause_timer());
    assert!(client.reload_timer());
    assert!(client.load_next());
    assert!(client.load_previous());
    assert!(client.add_time(60_000));
    assert!(client.remove_time(60_000));
    assert!(client.nudge_time(-30_000));
    assert!(client.set_blackout(true));
    assert!(client.set_blink(false));
    assert!(client.set_event_duration("abc", 90_000));

    // poll plus eleven commands
    assert!(server.wait_for_received(12, DEFAULT_TIMEOUT).await);
    assert_eq!(
        server.received_json(),
        vec![
            json!({"tag": "poll"}),
            json!({"tag": "start"}),
            json!({"tag": "pause"}),
            json!({"tag": "reload"}),
            json!({"tag": "load", "payload": "next"}),
            json!({"tag": "load", "payload": "previous"}),
            json!({"tag": "addtime", "payload": {"add": 60000}}),
            json!({"tag": "addtime", "payload": {"remove": 60000}}),
            json!({"tag": "addtime", "payload": {"remove": 30000}}),
            json!({"tag": "message", "payload": {"timer": {"blackout": true}}}),
            json!({"tag": "message", "payload": {"timer": {"blink": false}}}),
            json!({"tag": "change", "payload": {"abc": {"duration": 90000}}}),
        ]
    );

    client.stop().await;
}

#[tokio::test]
async fn test_change_duration_without_event_sends_nothing() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;
    assert!(server.wait_for_received(1, DEFAULT_TIMEOUT).await);

    assert!(!client.change_event_duration(60_000));

    tokio::time::sleep(SHORT).await;
    assert!(server.received_tags("change").is_empty());
    assert_eq!(server.received().len(), 1);

    client.stop().await;
}

#[tokio::test]
async fn test_change_duration_uses_current_event() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    server.push(json!({
        "timer": {"current": 10000},
        "eventNow": {"id": "evt-7", "title": "Talk", "duration": 600000}
    }));
    assert!(collector.wait_for_count(1, DEFAULT_TIMEOUT).await);
    assert_eq!(client.current_event().unwrap().id, "evt-7");

    assert!(client.change_event_duration(60_000));
    assert!(client.change_event_duration(-700_000));

    assert!(server.wait_for_received(3, DEFAULT_TIMEOUT).await);
    assert_eq!(
        server.received_tags("change"),
        vec![
            json!({"tag": "change", "payload": {"evt-7": {"duration": 660000}}}),
            json!({"tag": "change", "payload": {"evt-7": {"duration": 0}}}),
        ]
    );

    client.stop().await;
}

#[tokio::test]
async fn test_command_handle_from_other_task() {
    let server = MockOntime::start().await;
    let collector = TimerCollector::new();
    let client = connected_client(&server, &collector).await;

    let commands = client.commands();
    let sent = tokio::task::spawn_blocking(move || {
        (0..5).filter(|_| commands.add_time(1000)).count()
    })
    .await
    .unwrap();
    assert_eq!(sent, 5);

    assert!(server.wait_for_received(6, DEFAULT_TIMEOUT).await);
    assert_eq!(server.received_tags("addtime").len(), 5);

    client.stop().await;
}

// ============================================================================
// Probe Tests
// ============================================================================

#[tokio::test]
async fn test_probe_success_and_client_errors() {
    for status in [200, 204, 404] {
        let server = MockHttp::start(status).await;
        assert!(probe(&server.url(), Duration::from_secs(2)).await, "status {}", status);
        assert_eq!(server.requests(), 1);
    }
}

#[tokio::test]
async fn test_probe_server_error() {
    let server = MockHttp::start(503).await;
    assert!(!probe(&server.url(), Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_probe_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = OntimeClient::builder()
        .probe_timeout(Duration::from_millis(500))
        .build();
    assert!(!client.probe(&format!("http://127.0.0.1:{}", port)).await);
    assert!(!client.probe("not a url at all").await);
}

#[tokio::test]
async fn test_probe_blocking() {
    let server = MockHttp::start(200).await;
    let url = server.url();

    let reachable = tokio::task::spawn_blocking(move || probe_blocking(&url, Duration::from_secs(2)))
        .await
        .unwrap();
    assert!(reachable);
}
