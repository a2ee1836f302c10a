//! End-to-end integration tests for the Lustre Concierge pipeline.
//!
//! These tests exercise the full path from submitted text to rendered
//! outcome: guard classification, context-window maintenance, the
//! completion client, and the truncation policy — over a scripted
//! transport so no network is involved.

use std::sync::{Arc, Mutex};

use lustre_client::{ChatRequest, TRUNCATION_NOTICE, Transport};
use lustre_config::AppConfig;
use lustre_core::error::ClientError;
use lustre_core::message::Role;
use lustre_guard::RuleCategory;
use lustre_session::{Session, TurnOutcome, TurnPhase};

// ── Scripted transport ───────────────────────────────────────────────

/// A transport that returns scripted outcomes in sequence and panics
/// when a test makes more calls than it scripted.
struct ScriptedTransport {
    outcomes: Mutex<Vec<Result<String, ClientError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    fn new(outcomes: Vec<Result<String, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(vec![]),
        })
    }

    fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let mut requests = self.requests.lock().unwrap();
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            panic!("ScriptedTransport exhausted at call #{}", requests.len() + 1);
        }
        requests.push(request.clone());
        outcomes.remove(0)
    }
}

fn session_over(transport: Arc<ScriptedTransport>) -> Session {
    Session::from_config(&AppConfig::default(), transport)
}

// ── Scenarios ────────────────────────────────────────────────────────

#[tokio::test]
async fn conversation_mixes_canned_and_model_turns() {
    let transport = ScriptedTransport::replying(&[
        "A hydrating mist keeps makeup fresh.",
        "Reapply every two hours in the sun.",
    ]);
    let mut session = session_over(transport.clone());

    // Turn 1: real question → model
    match session.handle_turn("how do I keep makeup fresh all day?").await {
        TurnOutcome::Completed { reply } => {
            assert_eq!(reply, "A hydrating mist keeps makeup fresh.");
        }
        other => panic!("expected completion, got {other:?}"),
    }

    // Turn 2: greeting → answered locally, transport untouched
    match session.handle_turn("hello").await {
        TurnOutcome::Canned { category, .. } => {
            assert_eq!(category, RuleCategory::Greeting);
        }
        other => panic!("expected canned greeting, got {other:?}"),
    }
    assert_eq!(transport.calls(), 1);

    // Turn 3: back to the model, with turn 1 (and only turn 1) as history
    match session.handle_turn("and how often should I reapply SPF?").await {
        TurnOutcome::Completed { reply } => {
            assert_eq!(reply, "Reapply every two hours in the sun.");
        }
        other => panic!("expected completion, got {other:?}"),
    }

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let history = &requests[1].history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "how do I keep makeup fresh all day?");
    assert_eq!(history[1].role, Role::Assistant);
    // The canned greeting never reached the model
    assert!(history.iter().all(|m| m.content != "hello"));
}

#[tokio::test]
async fn competitor_question_never_reaches_the_network() {
    let transport = ScriptedTransport::new(vec![]);
    let mut session = session_over(transport.clone());

    match session.handle_turn("is Maybelline mascara better?").await {
        TurnOutcome::Canned { category, .. } => {
            assert_eq!(category, RuleCategory::Competitor);
        }
        other => panic!("expected canned redirect, got {other:?}"),
    }

    assert_eq!(transport.calls(), 0);
    assert!(session.context().is_empty());
}

#[tokio::test]
async fn failure_mid_conversation_recovers() {
    let transport = ScriptedTransport::new(vec![
        Err(ClientError::ServiceUnavailable { status_code: 503 }),
        Ok("A ceramide cream repairs the skin barrier.".into()),
    ]);
    let mut session = session_over(transport.clone());

    // First attempt fails with the fixed sentence for the kind
    match session.handle_turn("what repairs a damaged skin barrier?").await {
        TurnOutcome::Failed { error, message } => {
            assert!(matches!(error, ClientError::ServiceUnavailable { .. }));
            assert!(message.contains("temporarily unavailable"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(session.phase(), TurnPhase::Idle);

    // Resubmission goes straight back out and succeeds
    match session.handle_turn("what repairs a damaged skin barrier?").await {
        TurnOutcome::Completed { reply } => {
            assert!(reply.contains("ceramide"));
        }
        other => panic!("expected completion, got {other:?}"),
    }

    // Both submissions were real turns; the failed one stayed in context
    let window = session.context().snapshot();
    assert_eq!(window.len(), 3);
    assert_eq!(window[0].content, window[1].content);
    assert_eq!(window[2].role, Role::Assistant);
}

#[tokio::test]
async fn long_replies_are_truncated_through_the_whole_pipeline() {
    let long_reply = "glow ".repeat(400); // 2000 chars
    let transport = ScriptedTransport::replying(&[&long_reply]);
    let mut session = session_over(transport);

    match session.handle_turn("tell me everything about your serums").await {
        TurnOutcome::Completed { reply } => {
            assert!(reply.ends_with(TRUNCATION_NOTICE));
            let kept = reply.strip_suffix(TRUNCATION_NOTICE).unwrap();
            assert_eq!(kept.chars().count(), 1500);
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn window_bound_holds_across_a_long_conversation() {
    let replies: Vec<String> = (0..15).map(|i| format!("answer {i}")).collect();
    let transport = ScriptedTransport::new(replies.iter().map(|r| Ok(r.clone())).collect());
    let mut session = session_over(transport.clone());

    for i in 0..15 {
        session.handle_turn(&format!("question {i}")).await;
    }

    assert_eq!(session.context().len(), 10);

    // The last request carried at most 9 prior messages plus the new one
    let requests = transport.requests.lock().unwrap();
    let last = requests.last().unwrap();
    assert_eq!(last.history.len(), 9);
    assert_eq!(last.user_message.content, "question 14");
}
