//! The built-in `execute_code` tool.

use std::sync::Arc;

use async_trait::async_trait;
use conductor_tools::{ParamKind, ParamSpec, Tool, ToolError, ToolRegistry, ToolResult, ToolSpec};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::denylist;
use crate::error::SandboxError;
use crate::eval::{self, EvalConfig};
use crate::store::RecordStore;

/// Registry name of the code-execution tool.
pub const CODE_TOOL_NAME: &str = "execute_code";

/// Ad-hoc data-analysis tool backed by the restricted interpreter.
///
/// The caller never sees a return value from the code itself: the payload is
/// whatever the code assigned to `result` (tables in column/row form),
/// together with captured print output and a visualization descriptor built
/// from the call's presentation hints.
pub struct CodeInterpreter {
    store: Arc<dyn RecordStore>,
    config: EvalConfig,
}

impl CodeInterpreter {
    /// Creates the interpreter over a record store with default limits.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            config: EvalConfig::default(),
        }
    }

    /// Overrides the interpreter limits.
    #[must_use]
    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the interpreter and registers it in the static catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if `execute_code` is already registered.
    pub fn install(registry: &ToolRegistry, store: Arc<dyn RecordStore>) -> ToolResult<()> {
        registry.register_static(Self::spec()?, Self::new(store))
    }

    fn spec() -> ToolResult<ToolSpec> {
        Ok(ToolSpec::new(
            CODE_TOOL_NAME,
            "Run a short script for ad-hoc data analysis; assign the value to show to `result`",
        )?
        .with_param(ParamSpec::new("code", ParamKind::String, "Script to execute").required())
        .with_param(ParamSpec::new(
            "visualization_type",
            ParamKind::String,
            "How the result should be rendered (table, number, chart)",
        ))
        .with_param(ParamSpec::new(
            "title",
            ParamKind::String,
            "Caption shown above the rendered result",
        )))
    }
}

#[async_trait]
impl Tool for CodeInterpreter {
    async fn invoke(&self, params: Map<String, Value>) -> ToolResult<Value> {
        let Some(Value::String(code)) = params.get("code") else {
            return Err(ToolError::MissingParameter {
                name: "code".to_owned(),
            });
        };
        let vis_kind = params
            .get("visualization_type")
            .and_then(Value::as_str)
            .unwrap_or("table")
            .to_owned();
        let title = params
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        // The denylist runs before any engine exists: a rejected payload
        // executes nothing and captures nothing.
        if let Some(token) = denylist::blocked_token(code) {
            warn!(token, "rejected code payload before execution");
            return Err(ToolError::rejected(
                SandboxError::Rejected {
                    token: token.to_owned(),
                }
                .to_string(),
            ));
        }

        let code = code.clone();
        let store = Arc::clone(&self.store);
        let config = self.config;
        let evaluation = tokio::task::spawn_blocking(move || eval::run(&code, &store, config))
            .await
            .map_err(|err| ToolError::execution(format!("sandbox task failed: {err}")))?;

        match evaluation {
            Ok(eval) => {
                info!(visualization = %vis_kind, "code evaluation succeeded");
                let mut payload = json!({
                    "result": eval.result,
                    "stdout": eval.stdout,
                });
                if !eval.result.is_null() {
                    payload["visualization"] = json!({
                        "type": vis_kind,
                        "title": title,
                        "data": eval.result,
                    });
                }
                Ok(payload)
            }
            Err(SandboxError::Execution { reason, stdout }) => {
                let message = if stdout.is_empty() {
                    reason
                } else {
                    format!("{reason}; output before failure:\n{stdout}")
                };
                Err(ToolError::execution(message))
            }
            Err(rejected @ SandboxError::Rejected { .. }) => {
                Err(ToolError::rejected(rejected.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::store::MemoryStore;

    use super::*;

    fn interpreter() -> (Arc<MemoryStore>, CodeInterpreter) {
        let store = Arc::new(MemoryStore::new().with_result(
            "SELECT symbol, price FROM prices",
            json!([{"symbol": "ETH", "price": 42.5}]),
        ));
        let tool = CodeInterpreter::new(Arc::clone(&store) as Arc<dyn RecordStore>);
        (store, tool)
    }

    fn call(code: &str) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("code".into(), json!(code));
        params.insert("visualization_type".into(), json!("number"));
        params.insert("title".into(), json!("Answer"));
        params
    }

    #[tokio::test]
    async fn payload_carries_result_stdout_and_visualization() {
        let (_store, tool) = interpreter();
        let payload = tool
            .invoke(call("print(\"working\"); result = 42;"))
            .await
            .expect("invoke");
        assert_eq!(payload["result"], json!(42));
        assert_eq!(payload["stdout"], json!("working\n"));
        assert_eq!(payload["visualization"]["type"], json!("number"));
        assert_eq!(payload["visualization"]["title"], json!("Answer"));
        assert_eq!(payload["visualization"]["data"], json!(42));
    }

    #[tokio::test]
    async fn null_result_omits_the_visualization() {
        let (_store, tool) = interpreter();
        let payload = tool
            .invoke(call("print(\"only output\");"))
            .await
            .expect("invoke");
        assert_eq!(payload["result"], Value::Null);
        assert!(payload.get("visualization").is_none());
    }

    #[tokio::test]
    async fn denylisted_code_is_rejected_without_running() {
        let (store, tool) = interpreter();
        let err = tool
            .invoke(call("open_store().query(\"x\"); exec(payload)"))
            .await
            .expect_err("must reject");
        assert!(err.to_string().contains("blocked token `exec(`"));
        // Nothing executed: the store was never touched.
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn execution_fault_keeps_prior_output_in_the_message() {
        let (_store, tool) = interpreter();
        let err = tool
            .invoke(call("print(\"partial\"); this_fn_does_not_exist();"))
            .await
            .expect_err("must fail");
        let message = err.to_string();
        assert!(message.contains("output before failure"));
        assert!(message.contains("partial"));
    }

    #[tokio::test]
    async fn missing_code_parameter_is_named() {
        let (_store, tool) = interpreter();
        let err = tool.invoke(Map::new()).await.expect_err("must fail");
        assert_eq!(err.to_string(), "missing required parameter `code`");
    }

    #[tokio::test]
    async fn store_rows_flow_into_a_table_result() {
        let (_store, tool) = interpreter();
        let code = r#"
            let rows = open_store().query("SELECT symbol, price FROM prices");
            let t = table(["symbol", "price"], []);
            for row in rows {
                t.push_row([row.symbol, row.price]);
            }
            result = t;
        "#;
        let payload = tool.invoke(call(code)).await.expect("invoke");
        assert_eq!(
            payload["result"],
            json!({"columns": ["symbol", "price"], "rows": [["ETH", 42.5]]})
        );
    }
}
