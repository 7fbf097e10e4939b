//! Structured tool invocation requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One invocation request recovered from generated text.
///
/// Mirrors the embedded wire format: an object with a `tool` name and an
/// optional `params` map. The parameter map is untyped on purpose; handlers
/// and bindings validate the shapes they care about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    tool: String,
    #[serde(default)]
    params: Map<String, Value>,
}

impl ToolCall {
    /// Creates a request for the named tool with no parameters.
    #[must_use]
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            params: Map::new(),
        }
    }

    /// Creates a request from a name and a ready parameter map.
    #[must_use]
    pub fn from_parts(tool: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            params,
        }
    }

    /// Adds one parameter, replacing any previous value for the key.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Name of the tool to invoke.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Parameters supplied with the request.
    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Consumes the request, returning its parameter map.
    #[must_use]
    pub fn into_params(self) -> Map<String, Value> {
        self.params
    }
}
