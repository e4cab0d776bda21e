//! End-to-end session tests against a scripted engine.
//!
//! Each test drives `run_session` with a `FakeEngine` script and asserts
//! on the ordered event stream the client would see.

mod fixtures;

use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use fixtures::{FakeEngine, GateProbe, Step};
use sluice_core::engine::{ConversationOptions, ToolUseRequest};
use sluice_core::permission::{PermissionCoordinator, PermissionOutcome, ResolveError};
use sluice_core::session::{EventRx, SessionEnd, event_channel, run_session};
use sluice_types::{DecisionOutcome, OutputEvent, PermissionDecision};

const TICK: Duration = Duration::from_secs(2);

struct Harness {
    permissions: PermissionCoordinator,
    cancel: CancellationToken,
    events: EventRx,
    driver: tokio::task::JoinHandle<SessionEnd>,
}

fn start(engine: FakeEngine) -> Harness {
    let permissions = PermissionCoordinator::new();
    let cancel = CancellationToken::new();
    let (sink, events) = event_channel(&cancel);

    let driver = tokio::spawn({
        let permissions = permissions.clone();
        let cancel = cancel.clone();
        async move {
            run_session(
                &engine,
                permissions,
                ConversationOptions {
                    prompt: "do the thing".to_string(),
                    ..ConversationOptions::default()
                },
                sink,
                cancel,
            )
            .await
        }
    });

    Harness {
        permissions,
        cancel,
        events,
        driver,
    }
}

async fn drain(mut events: EventRx) -> Vec<OutputEvent> {
    let mut all = Vec::new();
    while let Some(event) = timeout(TICK, events.recv()).await.expect("stream stalled") {
        all.push(event);
    }
    all
}

#[tokio::test]
async fn test_full_conversation_stream_in_order() {
    let harness = start(FakeEngine {
        steps: vec![
            Step::Message(json!({"type": "system", "subtype": "init",
                "session_id": "s1", "model": "sonnet", "tools": ["bash"]})),
            Step::Message(json!({"type": "assistant", "message": {"content": [
                {"type": "text", "text": "Hello"}]}})),
            Step::Message(json!({"type": "assistant", "message": {"content": [
                {"type": "text", "text": "Hello, world"},
                {"type": "tool_use", "id": "t1", "name": "read_file", "input": {"path": "/a"}}]}})),
            Step::Message(json!({"type": "user", "message": {"content": [
                {"type": "tool_result", "tool_use_id": "t1", "content": "file body"}]}})),
            Step::Message(json!({"type": "result", "subtype": "success",
                "num_turns": 1, "duration_ms": 10, "session_id": "s1",
                "usage": {"input_tokens": 3, "output_tokens": 9}})),
        ],
        ..FakeEngine::default()
    });

    let events = drain(harness.events).await;
    assert_eq!(harness.driver.await.unwrap(), SessionEnd::Completed);

    let kinds: Vec<&str> = events.iter().map(OutputEvent::event_type).collect();
    assert_eq!(
        kinds,
        vec!["status", "text", "text", "tool_use", "tool_result", "result", "done"]
    );
    assert_eq!(
        events[1],
        OutputEvent::Text {
            text: "Hello".to_string()
        }
    );
    assert_eq!(
        events[2],
        OutputEvent::Text {
            text: ", world".to_string()
        }
    );
    let OutputEvent::Result(result) = &events[5] else {
        panic!("expected result event");
    };
    assert_eq!(result.usage.as_ref().unwrap().output_tokens, 9);
}

#[tokio::test]
async fn test_open_failure_emits_error_then_done() {
    let harness = start(FakeEngine {
        open_error: Some("spawn failed: no engine executable".to_string()),
        ..FakeEngine::default()
    });

    let events = drain(harness.events).await;
    assert_eq!(harness.driver.await.unwrap(), SessionEnd::Errored);

    assert_eq!(events.len(), 2);
    let OutputEvent::Error { message } = &events[0] else {
        panic!("expected error event first, got {:?}", events[0]);
    };
    assert!(message.contains("spawn failed"));
    assert_eq!(events[1], OutputEvent::Done);
}

#[tokio::test]
async fn test_mid_stream_failure_keeps_prior_events() {
    let harness = start(FakeEngine {
        steps: vec![
            Step::Message(json!({"type": "assistant", "message": {"content": [
                {"type": "text", "text": "partial"}]}})),
            Step::Fail("engine crashed".to_string()),
        ],
        ..FakeEngine::default()
    });

    let events = drain(harness.events).await;
    assert_eq!(harness.driver.await.unwrap(), SessionEnd::Errored);

    let kinds: Vec<&str> = events.iter().map(OutputEvent::event_type).collect();
    assert_eq!(kinds, vec!["text", "error", "done"]);
}

#[tokio::test]
async fn test_cancellation_mid_stream_still_emits_done() {
    let mut harness = start(FakeEngine {
        steps: vec![Step::Message(json!({"type": "assistant", "message": {"content": [
            {"type": "text", "text": "working..."}]}}))],
        hang_after_steps: true,
        ..FakeEngine::default()
    });

    let first = timeout(TICK, harness.events.recv()).await.unwrap().unwrap();
    assert_eq!(first.event_type(), "text");

    harness.cancel.cancel();

    let rest = drain(harness.events).await;
    assert_eq!(rest, vec![OutputEvent::Done]);
    assert_eq!(harness.driver.await.unwrap(), SessionEnd::Cancelled);
}

#[tokio::test]
async fn test_pending_permission_denied_on_cancel() {
    let (gate, outcome) = GateProbe::new(ToolUseRequest::new("bash", json!({"command": "ls"})));
    let mut harness = start(FakeEngine {
        hang_after_steps: true,
        gate: Some(gate),
        ..FakeEngine::default()
    });

    let event = timeout(TICK, harness.events.recv()).await.unwrap().unwrap();
    assert_eq!(event.event_type(), "permission_request");
    assert_eq!(harness.permissions.pending_count(), 1);

    harness.cancel.cancel();

    // The suspended tool call observes a deny within bounded time...
    let observed = timeout(TICK, outcome).await.unwrap().unwrap();
    assert_eq!(observed, PermissionOutcome::Deny);

    // ...the session still terminates with done, and nothing leaks.
    let rest = drain(harness.events).await;
    assert_eq!(rest, vec![OutputEvent::Done]);
    assert_eq!(harness.driver.await.unwrap(), SessionEnd::Cancelled);
    assert_eq!(harness.permissions.pending_count(), 0);
}

#[tokio::test]
async fn test_decision_resolves_suspended_tool_call_exactly_once() {
    let (gate, outcome) = GateProbe::new(ToolUseRequest::new("bash", json!({"command": "rm"})));
    let mut harness = start(FakeEngine {
        hang_after_steps: true,
        gate: Some(gate),
        ..FakeEngine::default()
    });

    let event = timeout(TICK, harness.events.recv()).await.unwrap().unwrap();
    let OutputEvent::PermissionRequest(request) = event else {
        panic!("expected permission request");
    };

    harness
        .permissions
        .resolve(PermissionDecision {
            request_id: request.permission_request_id.clone(),
            outcome: DecisionOutcome::Allow,
            updated_input: Some(json!({"command": "rm -i"})),
        })
        .unwrap();

    let observed = timeout(TICK, outcome).await.unwrap().unwrap();
    assert_eq!(
        observed,
        PermissionOutcome::Allow {
            input: json!({"command": "rm -i"})
        }
    );

    // A second decision for the same id is rejected, not silently absorbed.
    assert_eq!(
        harness.permissions.resolve(PermissionDecision {
            request_id: request.permission_request_id.clone(),
            outcome: DecisionOutcome::Deny,
            updated_input: None,
        }),
        Err(ResolveError::NotFound(request.permission_request_id))
    );

    harness.cancel.cancel();
    let rest = drain(harness.events).await;
    assert_eq!(rest, vec![OutputEvent::Done]);
}

#[tokio::test]
async fn test_client_disconnect_cancels_conversation() {
    let harness = start(FakeEngine {
        steps: vec![
            Step::Message(json!({"type": "assistant", "message": {"content": [
                {"type": "text", "text": "one"}]}})),
            Step::Message(json!({"type": "assistant", "message": {"content": [
                {"type": "text", "text": "one two"}]}})),
        ],
        hang_after_steps: true,
        ..FakeEngine::default()
    });

    // Client goes away: the next delivery attempt must cancel upstream work
    // instead of letting the conversation run on.
    drop(harness.events);

    let end = timeout(TICK, harness.driver).await.unwrap().unwrap();
    assert_eq!(end, SessionEnd::Cancelled);
    assert!(harness.cancel.is_cancelled());
}
