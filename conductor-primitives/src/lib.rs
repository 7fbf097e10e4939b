//! Core shared types for the Conductor tool-orchestration runtime.
//!
//! Everything a tool invocation touches on its way through the engine is
//! defined here: the request extracted from model output, the uniform result
//! envelope every handler produces, and the validation rules for tool names.

#![warn(missing_docs, clippy::pedantic)]

mod call;
mod envelope;
mod error;
mod name;
mod text;

/// Structured invocation request recovered from generated text.
pub use call::ToolCall;
/// Uniform result envelope returned by every tool invocation.
pub use envelope::{OutcomeMeta, ToolOutcome};
/// Error type and result alias shared across the runtime.
pub use error::{Error, Result};
/// Tool-name validation applied by the registry.
pub use name::{validate_tool_name, MAX_TOOL_NAME_LEN};
/// Character-budget truncation used for history and prompt payloads.
pub use text::truncate_chars;
