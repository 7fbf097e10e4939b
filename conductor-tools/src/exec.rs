//! Sequential tool-call execution.

use std::sync::Arc;

use conductor_primitives::{OutcomeMeta, ToolCall, ToolOutcome};
use tracing::{debug, info, warn};

use crate::registry::{ResolvedTool, ToolRegistry};
use crate::transport::RestTransport;

/// Runs extracted tool calls against the registry, one at a time.
///
/// The executor never returns an error: every failure mode (unknown tool,
/// missing parameters, handler errors, transport failures) is folded into a
/// `success=false` [`ToolOutcome`] so the orchestrator can relay it to the
/// model verbatim. Calls are independent; one failing call does not stop the
/// calls after it.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    transport: Arc<dyn RestTransport>,
}

impl ToolExecutor {
    /// Creates an executor over the shared registry and outbound transport.
    pub fn new(registry: Arc<ToolRegistry>, transport: Arc<dyn RestTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Executes a single call and wraps the result in an outcome envelope.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        let name = call.tool();
        let Some(resolved) = self.registry.resolve(name) else {
            warn!(tool = %name, "call to unknown tool");
            return ToolOutcome::fail(format!("unknown tool `{name}`"));
        };

        info!(tool = %name, "dispatching tool call");
        let outcome = match resolved {
            ResolvedTool::Native { tool, .. } => match tool.invoke(call.params().clone()).await {
                Ok(value) => {
                    let bytes = serde_json::to_vec(&value).map_or(0, |body| body.len());
                    ToolOutcome::ok(value).with_metadata(OutcomeMeta::default().with_bytes(bytes))
                }
                Err(err) => ToolOutcome::fail(err.to_string()),
            },
            ResolvedTool::Remote { binding, .. } => {
                let missing: Vec<&str> = binding
                    .required()
                    .iter()
                    .filter(|key| !call.params().contains_key(key.as_str()))
                    .map(String::as_str)
                    .collect();
                if missing.is_empty() {
                    self.transport.invoke(&binding, call.params()).await
                } else {
                    ToolOutcome::fail(format!(
                        "missing required parameters: {}",
                        missing.join(", ")
                    ))
                }
            }
        };
        debug!(tool = %name, success = outcome.success(), "tool call finished");
        outcome
    }

    /// Executes calls in extraction order and returns one outcome per call.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            outcomes.push(self.execute(call).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::binding::HttpBinding;
    use crate::spec::{ParamKind, ParamSpec, ToolSpec};
    use crate::tool::ToolError;

    #[derive(Default)]
    struct MockTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RestTransport for MockTransport {
        async fn invoke(&self, binding: &HttpBinding, params: &Map<String, Value>) -> ToolOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ToolOutcome::ok(json!({
                "url": binding.url(),
                "params": Value::Object(params.clone()),
            }))
        }
    }

    fn harness() -> (Arc<ToolRegistry>, Arc<MockTransport>, ToolExecutor) {
        let registry = Arc::new(ToolRegistry::new());
        let transport = Arc::new(MockTransport::default());
        let executor = ToolExecutor::new(Arc::clone(&registry), Arc::clone(&transport) as _);
        (registry, transport, executor)
    }

    fn echo_spec() -> ToolSpec {
        ToolSpec::new("echo", "Echoes its input back")
            .expect("spec")
            .with_param(ParamSpec::new("text", ParamKind::String, "Text to echo").required())
    }

    fn weather_binding() -> HttpBinding {
        HttpBinding::new("https://api.example.com", "/weather", crate::BindMethod::Get)
            .expect("binding")
            .with_required(vec!["city".into()])
    }

    #[tokio::test]
    async fn unknown_tool_fails_without_transport() {
        let (_registry, transport, executor) = harness();
        let outcome = executor.execute(&ToolCall::new("ghost")).await;
        assert!(!outcome.success());
        assert_eq!(outcome.error(), Some("unknown tool `ghost`"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn native_success_carries_byte_count() {
        let (registry, _transport, executor) = harness();
        registry
            .register_static(echo_spec(), |params: Map<String, Value>| async move {
                Ok(json!({ "echo": params.get("text").cloned().unwrap_or(Value::Null) }))
            })
            .expect("register");

        let call = ToolCall::new("echo").with_param("text", json!("hi"));
        let outcome = executor.execute(&call).await;
        assert!(outcome.success());
        assert_eq!(outcome.data(), Some(&json!({ "echo": "hi" })));
        let expected = serde_json::to_vec(&json!({ "echo": "hi" })).expect("encode").len();
        assert_eq!(outcome.metadata().bytes(), Some(expected));
    }

    #[tokio::test]
    async fn native_error_becomes_failure_envelope() {
        let (registry, _transport, executor) = harness();
        registry
            .register_static(echo_spec(), |_params: Map<String, Value>| async move {
                Err::<Value, _>(ToolError::execution("backend offline"))
            })
            .expect("register");

        let outcome = executor.execute(&ToolCall::new("echo")).await;
        assert!(!outcome.success());
        assert_eq!(outcome.error(), Some("tool execution failed: backend offline"));
    }

    #[tokio::test]
    async fn remote_missing_required_skips_network() {
        let (registry, transport, executor) = harness();
        let spec = ToolSpec::new("weather", "Looks up weather").expect("spec");
        registry
            .register_dynamic(spec, weather_binding())
            .expect("register");

        let outcome = executor.execute(&ToolCall::new("weather")).await;
        assert!(!outcome.success());
        assert_eq!(outcome.error(), Some("missing required parameters: city"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_call_reaches_transport_once() {
        let (registry, transport, executor) = harness();
        let spec = ToolSpec::new("weather", "Looks up weather").expect("spec");
        registry
            .register_dynamic(spec, weather_binding())
            .expect("register");

        let call = ToolCall::new("weather").with_param("city", json!("Oslo"));
        let outcome = executor.execute(&call).await;
        assert!(outcome.success());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        let data = outcome.data().expect("data");
        assert_eq!(data["url"], "https://api.example.com/weather");
        assert_eq!(data["params"]["city"], "Oslo");
    }

    #[tokio::test]
    async fn execute_all_is_ordered_and_keeps_going() {
        let (registry, _transport, executor) = harness();
        registry
            .register_static(echo_spec(), |params: Map<String, Value>| async move {
                Ok(Value::Object(params))
            })
            .expect("register");

        let calls = vec![
            ToolCall::new("echo").with_param("text", json!("one")),
            ToolCall::new("ghost"),
            ToolCall::new("echo").with_param("text", json!("two")),
        ];
        let outcomes = executor.execute_all(&calls).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success());
        assert!(!outcomes[1].success());
        assert!(outcomes[2].success());
        assert_eq!(outcomes[2].data(), Some(&json!({ "text": "two" })));
    }
}
