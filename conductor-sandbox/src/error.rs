//! Sandbox error definitions.

use thiserror::Error;

/// Result alias for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;

/// Failures the code-execution tool can produce.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The pre-execution scan found a denylisted token; nothing ran.
    #[error("code rejected before execution: contains blocked token `{token}`")]
    Rejected {
        /// The token that matched.
        token: String,
    },

    /// Evaluation started and raised a fault (including exceeding the
    /// operation budget). Output captured before the fault is preserved.
    #[error("code execution failed: {reason}")]
    Execution {
        /// Interpreter error text.
        reason: String,
        /// Print output captured before the fault.
        stdout: String,
    },
}
