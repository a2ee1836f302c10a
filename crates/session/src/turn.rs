//! One user turn, end to end.
//!
//! Per turn: `Idle → Classifying → ShortCircuited | AwaitingCompletion
//! → Completed | Failed → Idle`. Exactly one turn is in flight at a
//! time — `handle_turn` takes `&mut self`, so a second submission
//! cannot start until the first resolves. Every path ends back at
//! `Idle`; no failure is fatal to the session.

use std::sync::Arc;

use lustre_client::{CompletionClient, Transport};
use lustre_config::AppConfig;
use lustre_context::ContextWindow;
use lustre_core::error::ClientError;
use lustre_core::message::{Message, SessionId};
use lustre_guard::{RuleCategory, RuleTable, Verdict};
use tracing::{debug, info};

/// Where the engine is within the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Classifying,
    AwaitingCompletion,
}

/// The result of one submitted message.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// Answered locally by the guard; no network call was made
    Canned {
        category: RuleCategory,
        reply: String,
    },
    /// The model answered
    Completed { reply: String },
    /// Input rejected before classification (empty or overlong)
    Rejected { reason: String },
    /// The completion call failed; `message` is the fixed user-facing
    /// sentence for the error kind
    Failed {
        error: ClientError,
        message: &'static str,
    },
}

/// One conversation: guard, context window, completion client.
pub struct Session {
    id: SessionId,
    guard: Option<RuleTable>,
    context: ContextWindow,
    client: CompletionClient,
    system_prompt: String,
    max_input_chars: usize,
    phase: TurnPhase,
}

impl Session {
    /// Build a session from application config over the given
    /// transport.
    pub fn from_config(config: &AppConfig, transport: Arc<dyn Transport>) -> Self {
        let guard = config
            .guard
            .enabled
            .then(|| RuleTable::from_config(&config.guard));

        Self {
            id: SessionId::new(),
            guard,
            context: ContextWindow::new(config.limits.context_window),
            client: CompletionClient::from_config(config, transport),
            system_prompt: config.system_prompt(),
            max_input_chars: config.limits.max_input_chars,
            phase: TurnPhase::Idle,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The retained conversation window.
    pub fn context(&self) -> &ContextWindow {
        &self.context
    }

    /// Handle one submitted message.
    ///
    /// A canned verdict short-circuits before any context mutation:
    /// neither the message nor the canned reply is appended, so the
    /// window only ever holds turns the model actually saw. A
    /// pass-through message is appended before the call and stays in
    /// context even when the call fails.
    pub async fn handle_turn(&mut self, raw: &str) -> TurnOutcome {
        let input = raw.trim();

        if input.is_empty() {
            return TurnOutcome::Rejected {
                reason: "Please type a message first.".into(),
            };
        }

        if input.chars().count() > self.max_input_chars {
            return TurnOutcome::Rejected {
                reason: format!(
                    "Please keep messages under {} characters.",
                    self.max_input_chars
                ),
            };
        }

        self.phase = TurnPhase::Classifying;

        if let Some(guard) = &self.guard {
            if let Verdict::Canned { category, reply } = guard.classify(input) {
                info!(session = %self.id, category = category.as_str(), "Turn short-circuited");
                self.phase = TurnPhase::Idle;
                return TurnOutcome::Canned { category, reply };
            }
        }

        let user_message = Message::user(input);
        self.context.append(user_message.clone());

        // The request carries the new message separately; the history
        // is whatever else survived the window bound.
        let mut history = self.context.snapshot();
        history.pop();

        self.phase = TurnPhase::AwaitingCompletion;
        let result = self
            .client
            .complete(&self.system_prompt, history, user_message)
            .await;
        self.phase = TurnPhase::Idle;

        match result {
            Ok(reply) => {
                self.context.append(Message::assistant(&reply));
                debug!(session = %self.id, window = self.context.len(), "Turn completed");
                TurnOutcome::Completed { reply }
            }
            Err(error) => {
                info!(session = %self.id, error = %error, "Turn failed");
                let message = error.user_message();
                TurnOutcome::Failed { error, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lustre_client::ChatRequest;
    use std::sync::Mutex;

    struct StubTransport {
        outcome: Result<String, ClientError>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl StubTransport {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(reply.to_string()),
                requests: Mutex::new(vec![]),
            })
        }

        fn failing(err: ClientError) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(err),
                requests: Mutex::new(vec![]),
            })
        }

        fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        fn name(&self) -> &str {
            "stub"
        }

        async fn send(&self, request: &ChatRequest) -> Result<String, ClientError> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcome.clone()
        }
    }

    fn session_over(stub: Arc<StubTransport>) -> Session {
        Session::from_config(&AppConfig::default(), stub)
    }

    #[tokio::test]
    async fn greeting_is_answered_locally() {
        let stub = StubTransport::replying("unused");
        let mut session = session_over(stub.clone());

        match session.handle_turn("hello").await {
            TurnOutcome::Canned { category, reply } => {
                assert_eq!(category, RuleCategory::Greeting);
                assert!(reply.contains("Hello"));
            }
            other => panic!("expected canned greeting, got {other:?}"),
        }

        assert_eq!(stub.call_count(), 0);
        assert!(session.context().is_empty());
    }

    #[tokio::test]
    async fn competitor_question_is_redirected() {
        let stub = StubTransport::replying("unused");
        let mut session = session_over(stub.clone());

        match session.handle_turn("what's a good Maybelline mascara?").await {
            TurnOutcome::Canned { category, .. } => {
                assert_eq!(category, RuleCategory::Competitor);
            }
            other => panic!("expected canned redirect, got {other:?}"),
        }

        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn pass_through_records_both_turns() {
        let stub = StubTransport::replying("A rosewood shade would suit you.");
        let mut session = session_over(stub.clone());

        match session.handle_turn("which lipstick shade for everyday?").await {
            TurnOutcome::Completed { reply } => {
                assert_eq!(reply, "A rosewood shade would suit you.");
            }
            other => panic!("expected completion, got {other:?}"),
        }

        assert_eq!(stub.call_count(), 1);
        let window = session.context().snapshot();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "which lipstick shade for everyday?");
        assert_eq!(window[1].content, "A rosewood shade would suit you.");
    }

    #[tokio::test]
    async fn history_excludes_the_new_message() {
        let stub = StubTransport::replying("ok");
        let mut session = session_over(stub.clone());

        session.handle_turn("first question about serums").await;
        session.handle_turn("second question about toners").await;

        let requests = stub.requests.lock().unwrap();
        assert!(requests[0].history.is_empty());
        // Second request: prior user turn + assistant reply
        assert_eq!(requests[1].history.len(), 2);
        assert_eq!(requests[1].user_message.content, "second question about toners");
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_side_effects() {
        let stub = StubTransport::replying("unused");
        let mut session = session_over(stub.clone());

        assert!(matches!(
            session.handle_turn("   ").await,
            TurnOutcome::Rejected { .. }
        ));
        assert_eq!(stub.call_count(), 0);
        assert!(session.context().is_empty());
    }

    #[tokio::test]
    async fn overlong_input_is_rejected() {
        let stub = StubTransport::replying("unused");
        let mut session = session_over(stub.clone());

        let long = "why ".repeat(300); // 1200 chars
        match session.handle_turn(&long).await {
            TurnOutcome::Rejected { reason } => assert!(reason.contains("1000")),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn failure_surfaces_fixed_sentence_and_keeps_session_usable() {
        let stub = StubTransport::failing(ClientError::RateLimited);
        let mut session = session_over(stub.clone());

        match session.handle_turn("a real beauty question").await {
            TurnOutcome::Failed { error, message } => {
                assert!(matches!(error, ClientError::RateLimited));
                assert!(message.contains("wait a moment"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        // Back to idle, user turn retained, next submission goes out
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(session.context().len(), 1);

        session.handle_turn("trying again").await;
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn disabled_guard_forwards_everything() {
        let stub = StubTransport::replying("ok");
        let mut config = AppConfig::default();
        config.guard.enabled = false;
        let mut session = Session::from_config(&config, stub.clone());

        match session.handle_turn("hello").await {
            TurnOutcome::Completed { .. } => {}
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn window_stays_bounded_over_many_turns() {
        let stub = StubTransport::replying("ok");
        let mut session = session_over(stub);

        for i in 0..12 {
            session.handle_turn(&format!("question number {i}")).await;
        }

        assert_eq!(session.context().len(), 10);
    }

    #[tokio::test]
    async fn phase_returns_to_idle_on_every_path() {
        let stub = StubTransport::replying("ok");
        let mut session = session_over(stub);

        session.handle_turn("").await;
        assert_eq!(session.phase(), TurnPhase::Idle);

        session.handle_turn("hello").await;
        assert_eq!(session.phase(), TurnPhase::Idle);

        session.handle_turn("a real question").await;
        assert_eq!(session.phase(), TurnPhase::Idle);
    }
}
