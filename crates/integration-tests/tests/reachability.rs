//! Reachability monitor against live and dead backends.

use std::time::Duration;

use cartsync_client::{HttpProbe, Probe, ReachabilityMonitor, ReachabilityState, SystemClock};
use cartsync_integration_tests::{FakeBackend, closed_port_url};

const INTERVAL: Duration = Duration::from_millis(50);

#[tokio::test]
async fn test_live_backend_is_online() {
    let backend = FakeBackend::start().await.expect("Failed to start fake backend");
    let probe = HttpProbe::from_config(&backend.config()).expect("probe");
    assert!(probe.check().await);

    let handle = ReachabilityMonitor::start(probe, SystemClock, INTERVAL);
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("monitor should report within 5s")
        .expect("monitor alive");

    let status = handle.current();
    assert_eq!(status.state, ReachabilityState::Online);
    assert!(status.checked_at.is_some());
    handle.stop().await;
}

#[tokio::test]
async fn test_dead_backend_is_offline() {
    let url = closed_port_url().expect("Failed to reserve a port");
    let probe = HttpProbe::new(url, Duration::from_secs(1)).expect("probe");

    let handle = ReachabilityMonitor::start(probe, SystemClock, INTERVAL);
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("monitor should report within 5s")
        .expect("monitor alive");

    assert_eq!(handle.current().state, ReachabilityState::Offline);
    assert!(!handle.current().is_online());
    handle.stop().await;
}

#[tokio::test]
async fn test_backend_going_away_is_reported() {
    let backend = FakeBackend::start().await.expect("Failed to start fake backend");
    let probe = HttpProbe::from_config(&backend.config()).expect("probe");

    let handle = ReachabilityMonitor::start(probe, SystemClock, INTERVAL);
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("online within 5s")
        .expect("monitor alive");
    assert_eq!(rx.borrow_and_update().state, ReachabilityState::Online);

    drop(backend);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("offline within 5s")
        .expect("monitor alive");
    assert_eq!(rx.borrow_and_update().state, ReachabilityState::Offline);
    handle.stop().await;
}
