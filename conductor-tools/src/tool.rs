//! Handler trait and error definitions for tool execution.

use std::future::Future;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Trait implemented by static tool handlers.
///
/// Handlers receive the untyped parameter map recovered from model output and
/// return a JSON payload. Shape validation is the handler's job; any error it
/// returns is captured into a failed result envelope by the executor, never
/// raised further.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool with the given parameters, returning its payload.
    async fn invoke(&self, params: Map<String, Value>) -> ToolResult<Value>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(Map<String, Value>) -> Fut,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    async fn invoke(&self, params: Map<String, Value>) -> ToolResult<Value> {
        (self)(params).await
    }
}

/// Errors produced by tool registration and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A tool spec or binding failed validation.
    #[error("invalid tool spec: {reason}")]
    InvalidSpec {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A tool name failed the registry naming rules.
    #[error(transparent)]
    InvalidName(#[from] conductor_primitives::Error),

    /// Tool name collided with an existing registration in either catalog.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Requested tool does not exist in either catalog.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// A required parameter was absent from the invocation request.
    #[error("missing required parameter `{name}`")]
    MissingParameter {
        /// Name of the absent parameter.
        name: String,
    },

    /// A parameter was present but had the wrong shape.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The handler refused to run the request.
    #[error("rejected: {reason}")]
    Rejected {
        /// Human-readable refusal reason.
        reason: String,
    },

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the handler.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Creates a refusal error from the supplied reason.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
