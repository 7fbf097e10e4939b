//! Tool catalog and execution for the Conductor runtime.
//!
//! Tools live in a single registry under one namespace, whether they are
//! compiled in (static) or created at runtime from an HTTP binding (dynamic).
//! Both kinds resolve through the same tagged handler, so the executor has
//! exactly one dispatch path. The registry also renders the model-facing
//! catalog text that makes newly created tools usable within a session.

#![warn(missing_docs, clippy::pedantic)]

mod binding;
mod dynamic;
mod exec;
mod registry;
mod spec;
mod tool;
mod transport;

/// HTTP binding describing a dynamic tool's endpoint.
pub use binding::{BindMethod, HttpBinding};
/// Runtime tool creation with immediate self-testing.
pub use dynamic::{ToolCreator, CREATE_TOOL_NAME};
/// Uniform executor turning invocation requests into result envelopes.
pub use exec::ToolExecutor;
/// The two-catalog registry and its resolution types.
pub use registry::{ResolvedTool, ToolOrigin, ToolRegistry};
/// Parameter and tool schema types plus catalog rendering.
pub use spec::{ParamKind, ParamSpec, ToolSpec};
/// Handler trait, error type, and result alias.
pub use tool::{Tool, ToolError, ToolResult};
/// Seam to the outbound HTTP caller used by dynamic tools.
pub use transport::RestTransport;
