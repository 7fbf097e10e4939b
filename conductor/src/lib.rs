//! Tool-orchestration runtime facade.
//!
//! Depend on this crate via `cargo add conductor`. It bundles the internal
//! runtime crates behind feature flags so downstream users can enable or
//! disable components as needed for their assistants.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use conductor_primitives as primitives;

/// Two-pass conversation orchestrator (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use conductor_kernel as kernel;

/// Generation-service clients (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use conductor_adapters as adapters;

/// Tool registry, executor, and dynamic creation (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use conductor_tools as tools;

/// Tool-call extraction from generated text (enabled by `extract` feature).
#[cfg(feature = "extract")]
pub use conductor_extract as extract;

/// Bounded in-memory conversation store (enabled by `session` feature).
#[cfg(feature = "session")]
pub use conductor_session as session;

/// Domain allow-list and credential resolution (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use conductor_policy as policy;

/// Outbound REST gateway (enabled by `gateway` feature).
#[cfg(feature = "gateway")]
pub use conductor_gateway as gateway;

/// Constrained code execution (enabled by `sandbox` feature).
#[cfg(feature = "sandbox")]
pub use conductor_sandbox as sandbox;
