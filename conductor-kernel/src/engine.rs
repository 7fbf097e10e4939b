//! The two-pass chat orchestrator.

use std::sync::Arc;

use conductor_adapters::{CompletionRequest, GenerationClient};
use conductor_extract::CallExtractor;
use conductor_primitives::{ToolCall, ToolOutcome};
use conductor_session::{Message, SessionStore};
use conductor_tools::{RestTransport, ToolExecutor, ToolRegistry, ToolSpec};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::phase::{TurnPhase, TurnTrace};
use crate::prompt;

/// Reply sent to the caller when the generation service itself fails.
const GENERATION_FAILURE_REPLY: &str =
    "I ran into a problem reaching the language model. Please try again in a moment.";

/// Tunable knobs for the orchestrator.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    default_session_id: String,
    results_budget_chars: usize,
    max_output_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_session_id: "default".to_owned(),
            results_budget_chars: 8000,
            max_output_tokens: None,
            temperature: None,
        }
    }

    /// Session used when a request names none.
    #[must_use]
    pub fn with_default_session_id(mut self, id: impl Into<String>) -> Self {
        self.default_session_id = id.into();
        self
    }

    /// Character budget for the serialized tool results in the second pass.
    #[must_use]
    pub fn with_results_budget_chars(mut self, chars: usize) -> Self {
        self.results_budget_chars = chars;
        self
    }

    /// Output-token cap forwarded to the generation client.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Sampling temperature forwarded to the generation client.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One user turn to process.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    message: String,
    session_id: Option<String>,
}

impl ChatRequest {
    /// Creates a request against the default session.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
        }
    }

    /// Targets a named session instead of the default one.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// The answer envelope for one turn.
#[derive(Clone, Debug, Serialize)]
pub struct ChatReply {
    response: String,
    tools_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visualization: Option<Value>,
    #[serde(skip_serializing_if = "is_false")]
    error: bool,
}

impl ChatReply {
    /// The assistant's final text.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Names of the tools invoked this turn, in call order.
    #[must_use]
    pub fn tools_used(&self) -> &[String] {
        &self.tools_used
    }

    /// Visualization payload produced by a tool, when any.
    #[must_use]
    pub fn visualization(&self) -> Option<&Value> {
        self.visualization.as_ref()
    }

    /// True when the generation service failed and the reply is canned.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error
    }
}

/// A processed turn: the reply plus the phases it went through.
#[derive(Debug)]
pub struct ChatTurn {
    reply: ChatReply,
    trace: TurnTrace,
}

impl ChatTurn {
    /// The answer envelope.
    #[must_use]
    pub fn reply(&self) -> &ChatReply {
        &self.reply
    }

    /// Consumes the turn, keeping only the reply.
    #[must_use]
    pub fn into_reply(self) -> ChatReply {
        self.reply
    }

    /// Phase trace recorded while processing the turn.
    #[must_use]
    pub fn trace(&self) -> &TurnTrace {
        &self.trace
    }
}

/// A snapshot of the tool catalog exposed to callers.
///
/// Only statically registered tools are listed; dynamically created tools
/// stay callable but do not appear here.
#[derive(Clone, Debug, Serialize)]
pub struct CatalogListing {
    tools: Vec<ToolSpec>,
    count: usize,
}

impl CatalogListing {
    /// Listed tool specifications.
    #[must_use]
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Number of listed tools.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Drives the fixed two-pass protocol for each user turn.
pub struct ChatEngine {
    client: Arc<dyn GenerationClient>,
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    extractor: CallExtractor,
    sessions: Arc<SessionStore>,
    config: EngineConfig,
}

impl ChatEngine {
    /// Creates an engine over the shared runtime pieces.
    pub fn new(
        client: Arc<dyn GenerationClient>,
        registry: Arc<ToolRegistry>,
        transport: Arc<dyn RestTransport>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        let executor = ToolExecutor::new(Arc::clone(&registry), transport);
        Self {
            client,
            registry,
            executor,
            extractor: CallExtractor::new(),
            sessions,
            config: EngineConfig::new(),
        }
    }

    /// Replaces the default configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Lists the static tool catalog.
    #[must_use]
    pub fn catalog(&self) -> CatalogListing {
        let tools = self.registry.static_specs();
        let count = tools.len();
        CatalogListing { tools, count }
    }

    /// Processes one user turn end to end.
    ///
    /// Tool failures never surface here; they are relayed to the model as
    /// data. Only a generation-service failure produces an `error` reply,
    /// and in that case the session history is left untouched.
    pub async fn chat(&self, request: ChatRequest) -> ChatTurn {
        let turn_id = Uuid::new_v4();
        let session_id = request
            .session_id
            .as_deref()
            .unwrap_or(&self.config.default_session_id)
            .to_owned();
        info!(turn = %turn_id, session = %session_id, "processing chat turn");

        let mut trace = TurnTrace::new();

        trace.enter(TurnPhase::BuildingFirstPrompt);
        let history = self.sessions.history(&session_id).await;
        let system = prompt::system_prompt(&self.registry.describe_all());
        let first = prompt::first_messages(&system, &history, &request.message);

        trace.enter(TurnPhase::AwaitingFirstResponse);
        let first_text = match self.complete(first.clone()).await {
            Ok(text) => text,
            Err(reason) => {
                warn!(turn = %turn_id, %reason, "first generation call failed");
                return Self::failure_turn(trace);
            }
        };

        trace.enter(TurnPhase::ExtractingCalls);
        let known = self.registry.names();
        let calls = self.extractor.extract(&first_text, &known);

        if calls.is_empty() {
            trace.enter(TurnPhase::UpdatingSession);
            self.store_turn(&session_id, history, &request.message, None, &first_text)
                .await;
            trace.enter(TurnPhase::Done);
            return ChatTurn {
                reply: ChatReply {
                    response: first_text,
                    tools_used: Vec::new(),
                    visualization: None,
                    error: false,
                },
                trace,
            };
        }

        trace.enter(TurnPhase::ExecutingTools);
        info!(turn = %turn_id, calls = calls.len(), "executing extracted tool calls");
        let outcomes = self.executor.execute_all(&calls).await;
        let labeled = label_outcomes(&calls, outcomes);
        let visualization = pick_visualization(&labeled);
        let tools_used: Vec<String> = calls.iter().map(|call| call.tool().to_owned()).collect();

        trace.enter(TurnPhase::BuildingSecondPrompt);
        let results = prompt::results_payload(&labeled, self.config.results_budget_chars);
        let second = prompt::second_messages(first, &first_text, &results);

        trace.enter(TurnPhase::AwaitingSecondResponse);
        let final_text = match self.complete(second).await {
            Ok(text) => text,
            Err(reason) => {
                warn!(turn = %turn_id, %reason, "second generation call failed");
                return Self::failure_turn(trace);
            }
        };

        trace.enter(TurnPhase::UpdatingSession);
        self.store_turn(
            &session_id,
            history,
            &request.message,
            Some(&first_text),
            &final_text,
        )
        .await;

        trace.enter(TurnPhase::Done);
        ChatTurn {
            reply: ChatReply {
                response: final_text,
                tools_used,
                visualization,
                error: false,
            },
            trace,
        }
    }

    async fn complete(
        &self,
        messages: Vec<conductor_adapters::PromptMessage>,
    ) -> Result<String, String> {
        let mut request = CompletionRequest::new(messages).map_err(|err| err.to_string())?;
        if let Some(tokens) = self.config.max_output_tokens {
            request = request.with_max_output_tokens(tokens);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        self.client
            .complete(request)
            .await
            .map(conductor_adapters::Completion::into_text)
            .map_err(|err| err.to_string())
    }

    /// Writes the turn back over the snapshot taken at the start. A turn
    /// that raced this one on the same session is overwritten.
    async fn store_turn(
        &self,
        session_id: &str,
        snapshot: Vec<Message>,
        user_message: &str,
        tool_choice: Option<&str>,
        final_text: &str,
    ) {
        let mut messages = snapshot;
        messages.push(Message::user(user_message));
        if let Some(choice) = tool_choice {
            messages.push(Message::assistant(choice));
        }
        messages.push(Message::assistant(final_text));
        self.sessions.replace(session_id, messages).await;
    }

    fn failure_turn(mut trace: TurnTrace) -> ChatTurn {
        trace.enter(TurnPhase::Done);
        ChatTurn {
            reply: ChatReply {
                response: GENERATION_FAILURE_REPLY.to_owned(),
                tools_used: Vec::new(),
                visualization: None,
                error: true,
            },
            trace,
        }
    }
}

/// Labels each outcome `name#ordinal` with a per-name 1-based counter.
fn label_outcomes(calls: &[ToolCall], outcomes: Vec<ToolOutcome>) -> Vec<(String, ToolOutcome)> {
    let mut seen: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    calls
        .iter()
        .zip(outcomes)
        .map(|(call, outcome)| {
            let ordinal = seen.entry(call.tool()).or_insert(0);
            *ordinal += 1;
            (format!("{}#{ordinal}", call.tool()), outcome)
        })
        .collect()
}

/// Picks the visualization payload from successful outcomes; last one wins.
fn pick_visualization(labeled: &[(String, ToolOutcome)]) -> Option<Value> {
    labeled
        .iter()
        .filter(|(_, outcome)| outcome.success())
        .filter_map(|(_, outcome)| outcome.data())
        .filter_map(|data| data.get("visualization"))
        .next_back()
        .cloned()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use conductor_adapters::{AdapterError, AdapterMetadata, AdapterResult, Completion};
    use conductor_session::SessionConfig;
    use conductor_tools::{HttpBinding, ParamKind, ParamSpec};
    use serde_json::{json, Map};

    use super::*;

    struct ScriptedClient {
        metadata: AdapterMetadata,
        replies: Mutex<VecDeque<AdapterResult<Completion>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<AdapterResult<Completion>>) -> Arc<Self> {
            Arc::new(Self {
                metadata: AdapterMetadata::new("scripted", "scripted-1"),
                replies: Mutex::new(replies.into()),
            })
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        fn metadata(&self) -> &AdapterMetadata {
            &self.metadata
        }

        async fn complete(&self, _request: CompletionRequest) -> AdapterResult<Completion> {
            self.replies
                .lock()
                .expect("replies lock poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(AdapterError::transport("script exhausted")))
        }
    }

    struct EchoTransport;

    #[async_trait]
    impl RestTransport for EchoTransport {
        async fn invoke(
            &self,
            binding: &HttpBinding,
            _params: &Map<String, Value>,
        ) -> ToolOutcome {
            ToolOutcome::ok(json!({ "url": binding.url() }))
        }
    }

    fn registry_with_price_tool() -> Arc<ToolRegistry> {
        let registry = Arc::new(ToolRegistry::new());
        let spec = ToolSpec::new("get_price", "Latest price for a symbol")
            .expect("spec")
            .with_param(ParamSpec::new("symbol", ParamKind::String, "Ticker symbol").required());
        registry
            .register_static(spec, |params: Map<String, Value>| async move {
                Ok(json!({ "symbol": params.get("symbol"), "price": 42.5 }))
            })
            .expect("register");
        registry
    }

    fn engine(
        client: Arc<ScriptedClient>,
        registry: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
    ) -> ChatEngine {
        ChatEngine::new(client, registry, Arc::new(EchoTransport), sessions)
    }

    fn ok(text: &str) -> AdapterResult<Completion> {
        Ok(Completion::new(text))
    }

    #[tokio::test]
    async fn plain_answer_skips_the_second_pass() {
        let client = ScriptedClient::new(vec![ok("Just an answer.")]);
        let sessions = Arc::new(SessionStore::default());
        let engine = engine(client, registry_with_price_tool(), Arc::clone(&sessions));

        let turn = engine.chat(ChatRequest::new("hello")).await;
        assert_eq!(turn.reply().response(), "Just an answer.");
        assert!(turn.reply().tools_used().is_empty());
        assert!(!turn.reply().is_error());
        assert!(!turn.trace().visited(TurnPhase::ExecutingTools));

        let history = sessions.history("default").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content(), "Just an answer.");
    }

    #[tokio::test]
    async fn tool_turn_runs_both_passes_and_records_the_choice() {
        let first = "```json\n{\"tool\": \"get_price\", \"params\": {\"symbol\": \"ETH\"}}\n```";
        let client = ScriptedClient::new(vec![ok(first), ok("ETH is 42.5")]);
        let sessions = Arc::new(SessionStore::default());
        let engine = engine(client, registry_with_price_tool(), Arc::clone(&sessions));

        let turn = engine.chat(ChatRequest::new("price of ETH?")).await;
        assert_eq!(turn.reply().response(), "ETH is 42.5");
        assert_eq!(turn.reply().tools_used(), ["get_price"]);
        assert!(turn.trace().visited(TurnPhase::ExecutingTools));
        assert!(turn.trace().visited(TurnPhase::AwaitingSecondResponse));

        let history = sessions.history("default").await;
        assert_eq!(history.len(), 3);
        assert!(history[1].content().contains("get_price"));
        assert_eq!(history[2].content(), "ETH is 42.5");
    }

    #[tokio::test]
    async fn first_pass_failure_leaves_the_session_untouched() {
        let client = ScriptedClient::new(vec![Err(AdapterError::transport("offline"))]);
        let sessions = Arc::new(SessionStore::default());
        let engine = engine(client, registry_with_price_tool(), Arc::clone(&sessions));

        let turn = engine.chat(ChatRequest::new("hello")).await;
        assert!(turn.reply().is_error());
        assert_eq!(turn.reply().response(), GENERATION_FAILURE_REPLY);
        assert!(!sessions.contains("default").await);
    }

    #[tokio::test]
    async fn second_pass_failure_also_leaves_the_session_untouched() {
        let first = "```json\n{\"tool\": \"get_price\", \"params\": {\"symbol\": \"ETH\"}}\n```";
        let client =
            ScriptedClient::new(vec![ok(first), Err(AdapterError::transport("offline"))]);
        let sessions = Arc::new(SessionStore::default());
        let engine = engine(client, registry_with_price_tool(), Arc::clone(&sessions));

        let turn = engine.chat(ChatRequest::new("price of ETH?")).await;
        assert!(turn.reply().is_error());
        assert!(!sessions.contains("default").await);
    }

    #[tokio::test]
    async fn named_sessions_stay_separate() {
        let client = ScriptedClient::new(vec![ok("one"), ok("two")]);
        let sessions = Arc::new(SessionStore::default());
        let engine = engine(client, registry_with_price_tool(), Arc::clone(&sessions));

        engine
            .chat(ChatRequest::new("a").with_session("alpha"))
            .await;
        engine
            .chat(ChatRequest::new("b").with_session("beta"))
            .await;

        assert_eq!(sessions.history("alpha").await.len(), 2);
        assert_eq!(sessions.history("beta").await.len(), 2);
    }

    #[tokio::test]
    async fn repeated_tool_gets_ordinal_labels() {
        let calls = vec![
            ToolCall::new("get_price").with_param("symbol", json!("ETH")),
            ToolCall::new("get_price").with_param("symbol", json!("BTC")),
            ToolCall::new("get_news"),
        ];
        let outcomes = vec![
            ToolOutcome::ok(json!(1)),
            ToolOutcome::ok(json!(2)),
            ToolOutcome::fail("nope"),
        ];
        let labeled = label_outcomes(&calls, outcomes);
        let labels: Vec<&str> = labeled.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, ["get_price#1", "get_price#2", "get_news#1"]);
    }

    #[tokio::test]
    async fn last_successful_visualization_wins() {
        let labeled = vec![
            (
                "a#1".to_owned(),
                ToolOutcome::ok(json!({ "visualization": { "type": "table", "n": 1 } })),
            ),
            (
                "b#1".to_owned(),
                ToolOutcome::fail("down"),
            ),
            (
                "c#1".to_owned(),
                ToolOutcome::ok(json!({ "visualization": { "type": "table", "n": 2 } })),
            ),
        ];
        let viz = pick_visualization(&labeled).expect("visualization");
        assert_eq!(viz["n"], 2);
    }

    #[tokio::test]
    async fn catalog_lists_static_tools_only() {
        let registry = registry_with_price_tool();
        let binding = HttpBinding::new("https://api.example.com", "/news", conductor_tools::BindMethod::Get)
            .expect("binding");
        let spec = ToolSpec::new("get_news", "Latest headlines").expect("spec");
        registry.register_dynamic(spec, binding).expect("register");

        let client = ScriptedClient::new(vec![]);
        let sessions = Arc::new(SessionStore::default());
        let engine = engine(client, registry, sessions);

        let listing = engine.catalog();
        assert_eq!(listing.count(), 1);
        assert_eq!(listing.tools()[0].name(), "get_price");
    }

    #[tokio::test]
    async fn history_cap_applies_across_turns() {
        let mut replies = Vec::new();
        for i in 0..6 {
            replies.push(ok(&format!("reply {i}")));
        }
        let client = ScriptedClient::new(replies);
        let sessions = Arc::new(SessionStore::new(
            SessionConfig::default()
                .with_max_messages(std::num::NonZeroUsize::new(4).expect("cap")),
        ));
        let engine = engine(client, registry_with_price_tool(), Arc::clone(&sessions));

        for i in 0..6 {
            engine.chat(ChatRequest::new(format!("msg {i}"))).await;
        }

        let history = sessions.history("default").await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].content(), "reply 5");
    }
}
