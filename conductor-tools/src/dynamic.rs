//! The built-in `create_tool` tool.
//!
//! `create_tool` is the self-extension point of the runtime: the model calls
//! it with a REST endpoint description and, if the description validates (and
//! the optional live self-test passes), the new tool joins the dynamic
//! catalog and is callable from the next turn onward.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::binding::{BindMethod, HttpBinding};
use crate::registry::ToolRegistry;
use crate::spec::{ParamKind, ParamSpec, ToolSpec};
use crate::tool::{Tool, ToolError, ToolResult};
use crate::transport::RestTransport;

/// Registry name of the built-in creator tool.
pub const CREATE_TOOL_NAME: &str = "create_tool";

/// Registers model-described REST endpoints as callable tools.
///
/// The creator holds the registry it registers into, and the registry holds
/// the creator as a static tool, so both live for the life of the process.
pub struct ToolCreator {
    registry: Arc<ToolRegistry>,
    transport: Arc<dyn RestTransport>,
}

impl ToolCreator {
    /// Builds the creator and registers it in the static catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if `create_tool` is already registered.
    pub fn install(
        registry: &Arc<ToolRegistry>,
        transport: Arc<dyn RestTransport>,
    ) -> ToolResult<()> {
        let creator = Self {
            registry: Arc::clone(registry),
            transport,
        };
        registry.register_static(Self::spec()?, creator)
    }

    fn spec() -> ToolResult<ToolSpec> {
        Ok(ToolSpec::new(
            CREATE_TOOL_NAME,
            "Register a new HTTP tool at runtime; it becomes callable in later turns",
        )?
        .with_param(
            ParamSpec::new("tool_name", ParamKind::String, "Name for the new tool").required(),
        )
        .with_param(
            ParamSpec::new(
                "description",
                ParamKind::String,
                "What the new tool does, shown in the catalog",
            )
            .required(),
        )
        .with_param(
            ParamSpec::new("base_url", ParamKind::String, "API base URL (http or https)")
                .required(),
        )
        .with_param(
            ParamSpec::new("endpoint", ParamKind::String, "Path appended to the base URL")
                .required(),
        )
        .with_param(
            ParamSpec::new("method", ParamKind::String, "HTTP method (GET, POST, PUT, DELETE)")
                .required(),
        )
        .with_param(ParamSpec::new(
            "required_params",
            ParamKind::Array,
            "Parameter names every call must supply",
        ))
        .with_param(ParamSpec::new(
            "optional_params",
            ParamKind::Array,
            "Parameter names calls may supply",
        ))
        .with_param(ParamSpec::new(
            "api_key_env",
            ParamKind::String,
            "Credential name resolved from the credential store on each call",
        ))
        .with_param(ParamSpec::new(
            "example_params",
            ParamKind::Object,
            "Sample parameters for a live self-test before registration",
        )))
    }
}

#[async_trait]
impl Tool for ToolCreator {
    async fn invoke(&self, params: Map<String, Value>) -> ToolResult<Value> {
        let tool_name = require_str(&params, "tool_name")?.to_owned();
        let description = require_str(&params, "description")?.to_owned();
        let base_url = require_str(&params, "base_url")?;
        let endpoint = require_str(&params, "endpoint")?;
        let method: BindMethod = require_str(&params, "method")?.parse()?;
        let required = opt_string_list(&params, "required_params")?;
        let optional = opt_string_list(&params, "optional_params")?;
        let credential = opt_str(&params, "api_key_env")?;
        let example = opt_object(&params, "example_params")?;

        // Reject collisions before spending a network round trip.
        if self.registry.contains(&tool_name) {
            return Err(ToolError::DuplicateTool { name: tool_name });
        }

        let mut spec = ToolSpec::new(&tool_name, description)?;
        for param in &required {
            spec = spec.with_param(
                ParamSpec::new(param, ParamKind::String, "Request parameter").required(),
            );
        }
        for param in &optional {
            spec = spec.with_param(ParamSpec::new(param, ParamKind::String, "Request parameter"));
        }

        let mut binding = HttpBinding::new(base_url, endpoint, method)?
            .with_required(required)
            .with_optional(optional);
        if let Some(name) = credential {
            binding = binding.with_credential(name);
        }

        let self_tested = if let Some(example) = example {
            debug!(tool = %tool_name, "running registration self-test");
            let probe = self.transport.invoke(&binding, &example).await;
            if !probe.success() {
                let detail = probe.error().unwrap_or("no response").to_owned();
                return Err(ToolError::execution(format!("self-test failed: {detail}")));
            }
            binding = binding.with_self_test(probe);
            true
        } else {
            false
        };

        self.registry.register_dynamic(spec, binding)?;
        info!(tool = %tool_name, self_tested, "dynamic tool created");
        Ok(json!({ "registered": tool_name, "self_tested": self_tested }))
    }
}

fn require_str<'a>(params: &'a Map<String, Value>, name: &str) -> ToolResult<&'a str> {
    match params.get(name) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text),
        Some(Value::String(_)) => Err(ToolError::invalid_parameter(name, "must not be empty")),
        Some(_) => Err(ToolError::invalid_parameter(name, "must be a string")),
        None => Err(ToolError::MissingParameter { name: name.to_owned() }),
    }
}

fn opt_str<'a>(params: &'a Map<String, Value>, name: &str) -> ToolResult<Option<&'a str>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(ToolError::invalid_parameter(name, "must be a string")),
    }
}

fn opt_string_list(params: &Map<String, Value>, name: &str) -> ToolResult<Vec<String>> {
    let Some(value) = params.get(name) else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = value else {
        return Err(ToolError::invalid_parameter(name, "must be an array of strings"));
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => Ok(text.clone()),
            _ => Err(ToolError::invalid_parameter(name, "must be an array of strings")),
        })
        .collect()
}

fn opt_object(params: &Map<String, Value>, name: &str) -> ToolResult<Option<Map<String, Value>>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(ToolError::invalid_parameter(name, "must be an object")),
    }
}
