//! Turn controller: drives one user submission through the oracle.
//!
//! A cycle appends the user turn, assembles the prompt from the whole log,
//! calls the oracle, and appends the answer as an assistant turn. If the
//! oracle fails (or is cancelled, or answers with nothing) the cycle stops
//! before the assistant turn is written; the user turn stays in the log.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, field, info_span, warn};

use codepair_types::chat::{Turn, TurnState};
use codepair_types::config::OracleSettings;
use codepair_types::error::ChatError;
use codepair_types::llm::{CompletionRequest, LlmError, StreamEvent, Usage};

use crate::llm::box_provider::BoxLlmProvider;

use super::prompt::PromptAssembler;
use super::session::ChatSession;

/// Runs submission cycles against a completion oracle.
///
/// The oracle and its settings are fixed when the controller is built and
/// never change during a session.
pub struct TurnController {
    provider: BoxLlmProvider,
    settings: OracleSettings,
    assembler: PromptAssembler,
}

impl TurnController {
    pub fn new(provider: BoxLlmProvider, settings: OracleSettings) -> Self {
        Self {
            provider,
            settings,
            assembler: PromptAssembler::default(),
        }
    }

    /// Replace the default system instruction.
    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one cycle, waiting for the complete response.
    ///
    /// Returns the appended assistant turn.
    pub async fn submit(&self, session: &mut ChatSession, text: &str) -> Result<Turn, ChatError> {
        let request = self.begin(session, text, false)?;

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = false,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
        );

        match self.provider.complete(&request).instrument(span.clone()).await {
            Ok(response) => {
                record_usage(&span, response.usage);
                debug!(stop_reason = %response.stop_reason, "Oracle response received");
                self.finish(session, response.content, response.usage)
            }
            Err(e) => Err(Self::abort(session, e.into())),
        }
    }

    /// Run one cycle in streaming mode.
    ///
    /// Each text delta is handed to `on_delta` as it arrives. The assistant
    /// turn is appended only after the stream completes. Cancelling `cancel`
    /// stops the cycle with [`ChatError::Cancelled`].
    pub async fn submit_streaming<F>(
        &self,
        session: &mut ChatSession,
        text: &str,
        cancel: &CancellationToken,
        mut on_delta: F,
    ) -> Result<Turn, ChatError>
    where
        F: FnMut(&str),
    {
        let request = self.begin(session, text, true)?;

        let span = info_span!(
            "gen_ai.stream",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = true,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
        );

        let mut stream = self.provider.stream(request);
        let mut content = String::new();
        let mut usage = Usage::default();

        let outcome: Result<(), ChatError> = async {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break Err(ChatError::Cancelled),
                    event = stream.next() => match event {
                        Some(Ok(StreamEvent::TextDelta { text })) => {
                            on_delta(&text);
                            content.push_str(&text);
                        }
                        Some(Ok(StreamEvent::Usage(reported))) => usage = reported,
                        Some(Ok(StreamEvent::MessageDelta { stop_reason })) => {
                            debug!(%stop_reason, "Oracle stream finishing");
                        }
                        Some(Ok(StreamEvent::Connected)) => {}
                        Some(Ok(StreamEvent::Done)) | None => break Ok(()),
                        Some(Err(e)) => break Err(ChatError::from(e)),
                    },
                }
            }
        }
        .instrument(span.clone())
        .await;

        if outcome.is_ok() {
            record_usage(&span, usage);
        }

        match outcome {
            Ok(()) => self.finish(session, content, usage),
            Err(e) => Err(Self::abort(session, e)),
        }
    }

    /// Validate, append the user turn, and assemble the request.
    fn begin(
        &self,
        session: &mut ChatSession,
        text: &str,
        stream: bool,
    ) -> Result<CompletionRequest, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("message is empty".to_string()));
        }

        match session.state() {
            TurnState::Idle => {}
            TurnState::ResponseAppended => session.mark_rendered(),
            other => {
                warn!(state = %other, "Previous submission did not finish, resetting to idle");
                session.transition(TurnState::Idle);
            }
        }

        session.log_mut().append(Turn::user(text))?;
        session.transition(TurnState::UserAppended);

        session.transition(TurnState::Assembling);
        let request = self.assembler.request(session.log(), &self.settings, stream);
        debug!(messages = request.messages.len(), "Prompt assembled");

        session.transition(TurnState::AwaitingOracle);
        Ok(request)
    }

    /// Append the oracle's answer and close the cycle.
    fn finish(
        &self,
        session: &mut ChatSession,
        content: String,
        usage: Usage,
    ) -> Result<Turn, ChatError> {
        if content.trim().is_empty() {
            return Err(Self::abort(session, LlmError::EmptyResponse.into()));
        }

        let turn = Turn::assistant(content);
        session.log_mut().append(turn.clone())?;
        session.record_exchange(usage);
        session.transition(TurnState::ResponseAppended);
        Ok(turn)
    }

    fn abort(session: &mut ChatSession, error: ChatError) -> ChatError {
        warn!(session = %session.id(), error = %error, "Submission cycle aborted");
        session.transition(TurnState::Idle);
        error
    }
}

fn record_usage(span: &Span, usage: Usage) {
    span.record("gen_ai.usage.input_tokens", usage.input_tokens);
    span.record("gen_ai.usage.output_tokens", usage.output_tokens);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use codepair_types::chat::MessageRole;
    use codepair_types::llm::{CompletionResponse, StopReason};

    use crate::chat::log::GREETING;
    use crate::chat::prompt::SYSTEM_INSTRUCTION;
    use crate::llm::provider::{EventStream, LlmProvider};

    #[derive(Default)]
    struct Script {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    /// Oracle that answers from a fixed script and records every request.
    #[derive(Clone, Default)]
    struct ScriptedProvider {
        script: Arc<Script>,
    }

    impl ScriptedProvider {
        fn reply(self, reply: Result<&str, LlmError>) -> Self {
            self.script
                .replies
                .lock()
                .unwrap()
                .push_back(reply.map(str::to_string));
            self
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.script.requests.lock().unwrap().clone()
        }

        fn next_reply(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.script.requests.lock().unwrap().push(request.clone());
            self.script
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(LlmError::Provider {
                        message: "script exhausted".to_string(),
                    })
                })
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let content = self.next_reply(request)?;
            Ok(CompletionResponse {
                content,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage {
                    input_tokens: 12,
                    output_tokens: 4,
                },
            })
        }

        fn stream(&self, request: CompletionRequest) -> EventStream {
            let events: Vec<Result<StreamEvent, LlmError>> = match self.next_reply(&request) {
                Ok(text) => {
                    let mut events: Vec<_> = text
                        .split_inclusive(' ')
                        .map(|w| {
                            Ok(StreamEvent::TextDelta {
                                text: w.to_string(),
                            })
                        })
                        .collect();
                    events.push(Ok(StreamEvent::Usage(Usage {
                        input_tokens: 12,
                        output_tokens: 4,
                    })));
                    events.push(Ok(StreamEvent::Done));
                    events
                }
                Err(e) => vec![Err(e)],
            };
            Box::pin(futures_util::stream::iter(events))
        }
    }

    /// Oracle whose stream sends one delta and then never finishes.
    struct StallingProvider;

    impl LlmProvider for StallingProvider {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            futures_util::future::pending().await
        }

        fn stream(&self, _request: CompletionRequest) -> EventStream {
            let first = futures_util::stream::iter(vec![Ok(StreamEvent::TextDelta {
                text: "partial ".to_string(),
            })]);
            Box::pin(first.chain(futures_util::stream::pending()))
        }
    }

    /// Oracle whose stream breaks after the first delta.
    struct BrokenStreamProvider;

    impl LlmProvider for BrokenStreamProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Stream("unused".to_string()))
        }

        fn stream(&self, _request: CompletionRequest) -> EventStream {
            Box::pin(async_stream::stream! {
                yield Ok(StreamEvent::Connected);
                yield Ok(StreamEvent::TextDelta { text: "print(".to_string() });
                yield Err(LlmError::Stream("connection reset".to_string()));
            })
        }
    }

    fn controller(provider: impl LlmProvider + 'static) -> TurnController {
        TurnController::new(BoxLlmProvider::new(provider), OracleSettings::default())
    }

    #[test]
    fn test_fresh_session_holds_only_the_greeting() {
        let session = ChatSession::new("deepseek-r1:1.5b");
        let turns = session.log().all();
        assert_eq!(turns, [Turn::assistant(GREETING)]);
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_assistant_turns() {
        let provider = ScriptedProvider::default().reply(Ok("print('hello world')"));
        let ctl = controller(provider.clone());
        let mut session = ChatSession::new("deepseek-r1:1.5b");

        let turn = ctl
            .submit(&mut session, "print hello world in python")
            .await
            .unwrap();

        assert_eq!(turn.content(), "print('hello world')");
        let turns = session.log().all();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1], Turn::user("print hello world in python"));
        assert_eq!(turns[2], Turn::assistant("print('hello world')"));
        assert_eq!(session.state(), TurnState::ResponseAppended);
        assert_eq!(session.exchange_count(), 1);

        // The oracle saw the system instruction, the greeting, then the question.
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let roles: Vec<MessageRole> = requests[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [MessageRole::System, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(requests[0].messages[0].content, SYSTEM_INSTRUCTION);
        assert!(!requests[0].stream);

        session.mark_rendered();
        assert_eq!(session.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_input_without_calling_oracle() {
        let provider = ScriptedProvider::default().reply(Ok("unused"));
        let ctl = controller(provider.clone());
        let mut session = ChatSession::new("m");

        for input in ["", "   ", "\n"] {
            let err = ctl.submit(&mut session, input).await.unwrap_err();
            assert!(err.is_validation());
        }

        assert_eq!(session.log().len(), 1);
        assert!(provider.requests().is_empty());
        assert_eq!(session.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_oracle_failure_keeps_user_turn_only() {
        let provider = ScriptedProvider::default().reply(Err(LlmError::Connection {
            endpoint: "http://localhost:11434".to_string(),
            message: "connection refused".to_string(),
        }));
        let ctl = controller(provider);
        let mut session = ChatSession::new("m");

        let err = ctl
            .submit(&mut session, "print hello world in python")
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Oracle(LlmError::Connection { .. })));
        assert_eq!(session.log().len(), 2);
        assert_eq!(session.log().last().unwrap().role(), MessageRole::User);
        assert_eq!(session.state(), TurnState::Idle);
        assert_eq!(session.exchange_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_oracle_response_is_not_appended() {
        let provider = ScriptedProvider::default().reply(Ok("  "));
        let ctl = controller(provider);
        let mut session = ChatSession::new("m");

        let err = ctl.submit(&mut session, "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Oracle(LlmError::EmptyResponse)));
        assert_eq!(session.log().len(), 2);
        assert!(session.log().iter().all(|t| !t.is_blank()));
    }

    #[tokio::test]
    async fn test_next_cycle_sends_the_full_history() {
        let provider = ScriptedProvider::default()
            .reply(Err(LlmError::ModelNotFound("m".to_string())))
            .reply(Ok("second answer"));
        let ctl = controller(provider.clone());
        let mut session = ChatSession::new("m");

        assert!(ctl.submit(&mut session, "first").await.is_err());
        ctl.submit(&mut session, "second").await.unwrap();

        let requests = provider.requests();
        let last: Vec<&str> = requests[1]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(last, [SYSTEM_INSTRUCTION, GREETING, "first", "second"]);
        assert_eq!(session.log().len(), 4);
    }

    #[tokio::test]
    async fn test_submit_streaming_appends_after_completion() {
        let provider = ScriptedProvider::default().reply(Ok("use println! for debugging"));
        let ctl = controller(provider.clone());
        let mut session = ChatSession::new("m");
        let cancel = CancellationToken::new();

        let mut deltas: Vec<String> = Vec::new();
        let turn = ctl
            .submit_streaming(&mut session, "how do I debug?", &cancel, |d| {
                deltas.push(d.to_string())
            })
            .await
            .unwrap();

        assert!(deltas.len() > 1);
        assert_eq!(deltas.concat(), "use println! for debugging");
        assert_eq!(turn.content(), "use println! for debugging");
        assert_eq!(session.log().len(), 3);
        assert_eq!(session.last_usage().unwrap().output_tokens, 4);
        assert!(provider.requests()[0].stream);
    }

    #[tokio::test]
    async fn test_submit_streaming_cancel_leaves_no_assistant_turn() {
        let ctl = controller(StallingProvider);
        let mut session = ChatSession::new("m");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let err = ctl
            .submit_streaming(&mut session, "write a long essay", &cancel, |_| {
                trigger.cancel()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Cancelled));
        assert_eq!(session.log().len(), 2);
        assert_eq!(session.log().last().unwrap().role(), MessageRole::User);
        assert_eq!(session.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_submit_streaming_error_discards_partial_text() {
        let ctl = controller(BrokenStreamProvider);
        let mut session = ChatSession::new("m");
        let cancel = CancellationToken::new();

        let mut seen = String::new();
        let err = ctl
            .submit_streaming(&mut session, "hello", &cancel, |d| seen.push_str(d))
            .await
            .unwrap_err();

        assert_eq!(seen, "print(");
        assert!(matches!(err, ChatError::Oracle(LlmError::Stream(_))));
        assert_eq!(session.log().len(), 2);
    }

    #[tokio::test]
    async fn test_controller_exposes_settings() {
        let ctl = controller(ScriptedProvider::default());
        assert_eq!(ctl.provider_name(), "scripted");
        assert_eq!(ctl.settings().model, "deepseek-r1:1.5b");
    }
}
