//! The ad-hoc code-execution tool and its isolation policy.
//!
//! Two layers sit in front of evaluated code. The first is a fixed token
//! denylist, kept for behavioural parity with the system this runtime
//! replaces: it is a coarse, bypassable text filter and is documented as
//! exactly that, not as a security boundary. The second is the real
//! restriction: an embedded [rhai](https://rhai.rs) interpreter with no
//! file, process, or environment access, a bounded operation budget, and
//! only the capabilities this crate registers (tabular values, numeric
//! helpers, and a read-only-by-convention record-store handle).
//!
//! Evaluated code communicates by assigning to the pre-seeded `result`
//! variable; whatever it prints is captured and returned alongside.

#![warn(missing_docs, clippy::pedantic)]

mod denylist;
mod error;
mod eval;
mod interpreter;
mod store;

/// Sandbox error taxonomy.
pub use error::{SandboxError, SandboxResult};
/// Interpreter limits.
pub use eval::EvalConfig;
/// The `execute_code` tool.
pub use interpreter::{CodeInterpreter, CODE_TOOL_NAME};
/// Record-store seam, the single-writer gate, and the in-memory store.
pub use store::{MemoryStore, RecordStore, SingleWriterStore, StoreError, StoreResult};
