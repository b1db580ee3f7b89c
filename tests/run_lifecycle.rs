//! Run registry and coordinator lifecycle tests.
//!
//! Everything here runs against the scripted [`MockGateway`]; no network.

use std::sync::Arc;
use std::time::Duration;

use assistant_relay::assistant::{GatewayError, MockGateway, RunPollStatus};
use assistant_relay::runs::{RunCoordinator, RunOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn coordinator_with(gateway: &Arc<MockGateway>) -> RunCoordinator {
    RunCoordinator::new(gateway.clone(), POLL_INTERVAL)
}

#[tokio::test]
async fn test_cancel_of_unregistered_run_is_not_found() {
    let gateway = Arc::new(MockGateway::new());
    let coordinator = coordinator_with(&gateway);

    assert!(!coordinator.registry().request_cancel("never-registered"));
}

#[tokio::test]
async fn test_completed_on_first_poll() {
    let gateway = Arc::new(MockGateway::new());
    gateway.set_reply("hello");
    gateway.push_poll(Ok(RunPollStatus::Completed));

    let coordinator = coordinator_with(&gateway);
    coordinator.register("r1", "t1");

    let outcome = coordinator.drive("sk-test", "r1", "t1").await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed("hello".to_string()));
    assert!(!coordinator.registry().contains("r1"));
    assert!(coordinator.registry().is_empty());
}

#[tokio::test]
async fn test_cancel_before_drive_yields_cancelled() {
    let gateway = Arc::new(MockGateway::new());
    gateway.push_poll(Ok(RunPollStatus::InProgress));

    let coordinator = coordinator_with(&gateway);
    coordinator.register("r1", "t1");

    assert!(coordinator.registry().request_cancel("r1"));

    let outcome = coordinator.drive("sk-test", "r1", "t1").await.unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(!coordinator.registry().contains("r1"));
    // The remote cancel was issued for the right run.
    assert_eq!(gateway.cancel_calls(), vec!["r1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_polls_is_observed_next_tick() {
    let gateway = Arc::new(MockGateway::new());
    let coordinator = coordinator_with(&gateway);
    coordinator.register("r1", "t1");

    let driver = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.drive("sk-test", "r1", "t1").await })
    };

    // Let the loop take a few in-progress ticks before cancelling.
    tokio::time::sleep(POLL_INTERVAL * 3).await;
    assert!(coordinator.registry().request_cancel("r1"));

    let outcome = driver.await.unwrap().unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(!coordinator.registry().contains("r1"));
    assert_eq!(gateway.cancel_calls(), vec!["r1".to_string()]);
}

#[tokio::test]
async fn test_double_cancel_second_is_not_found() {
    let gateway = Arc::new(MockGateway::new());
    gateway.push_poll(Ok(RunPollStatus::InProgress));

    let coordinator = coordinator_with(&gateway);
    coordinator.register("r1", "t1");

    assert!(coordinator.registry().request_cancel("r1"));

    let outcome = coordinator.drive("sk-test", "r1", "t1").await.unwrap();
    assert_eq!(outcome, RunOutcome::Cancelled);

    // The entry is reaped; a second cancel sees "already finished".
    assert!(!coordinator.registry().request_cancel("r1"));
}

#[tokio::test]
async fn test_remote_failure_reaps_entry() {
    let gateway = Arc::new(MockGateway::new());
    gateway.push_poll(Ok(RunPollStatus::Failed {
        reason: "run expired".to_string(),
    }));

    let coordinator = coordinator_with(&gateway);
    coordinator.register("r1", "t1");

    let outcome = coordinator.drive("sk-test", "r1", "t1").await.unwrap();

    assert_eq!(outcome, RunOutcome::Failed("run expired".to_string()));
    assert!(!coordinator.registry().contains("r1"));
}

#[tokio::test]
async fn test_gateway_error_on_first_poll_reaps_entry() {
    let gateway = Arc::new(MockGateway::new());
    gateway.push_poll(Err(GatewayError::RemoteStatus {
        status: 502,
        body: "bad gateway".to_string(),
    }));

    let coordinator = coordinator_with(&gateway);
    coordinator.register("r1", "t1");

    let err = coordinator.drive("sk-test", "r1", "t1").await.unwrap_err();

    assert!(matches!(err, GatewayError::RemoteStatus { status: 502, .. }));
    assert!(!coordinator.registry().contains("r1"));
}

#[tokio::test(start_paused = true)]
async fn test_completion_after_several_ticks() {
    let gateway = Arc::new(MockGateway::new());
    gateway.set_reply("eventually");
    gateway.push_poll(Ok(RunPollStatus::InProgress));
    gateway.push_poll(Ok(RunPollStatus::InProgress));
    gateway.push_poll(Ok(RunPollStatus::Completed));

    let coordinator = coordinator_with(&gateway);
    coordinator.register("r1", "t1");

    let outcome = coordinator.drive("sk-test", "r1", "t1").await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed("eventually".to_string()));
    assert!(coordinator.registry().is_empty());
}

#[tokio::test]
async fn test_concurrent_runs_are_tracked_independently() {
    let gateway = Arc::new(MockGateway::new());
    let coordinator = coordinator_with(&gateway);

    coordinator.register("r1", "t1");
    coordinator.register("r2", "t2");
    assert_eq!(coordinator.registry().len(), 2);

    assert!(coordinator.registry().request_cancel("r1"));
    assert!(!coordinator.registry().cancel_requested("r2"));

    gateway.push_poll(Ok(RunPollStatus::InProgress));
    let outcome = coordinator.drive("sk-test", "r1", "t1").await.unwrap();
    assert_eq!(outcome, RunOutcome::Cancelled);

    // r2 is untouched by r1's lifecycle.
    assert!(coordinator.registry().contains("r2"));
    assert_eq!(coordinator.registry().len(), 1);
}
