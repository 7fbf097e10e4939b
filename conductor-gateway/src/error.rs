//! Gateway error definitions.

use std::time::Duration;

use thiserror::Error;

/// Result alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failures an outbound call can hit before or after the wire.
///
/// Every variant converts into a distinct `success=false` envelope message,
/// so the model (and anyone reading a transcript) can tell a timeout from a
/// refused connection from an upstream error status.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The target host matched no approved domain pattern.
    #[error("domain `{host}` is not on the approved list")]
    DomainNotAllowed {
        /// Host extracted from the binding URL.
        host: String,
    },

    /// The binding names a credential the store cannot resolve.
    #[error("credential `{name}` is not configured")]
    MissingCredential {
        /// Name of the missing credential entry.
        name: String,
    },

    /// The binding or the gateway itself is misconfigured.
    #[error("gateway configuration error: {reason}")]
    Configuration {
        /// Human-readable description of the problem.
        reason: String,
    },

    /// No response arrived within the call timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL of the call.
        url: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The connection could not be established at all.
    #[error("connection to {url} failed: {reason}")]
    Connect {
        /// Target URL of the call.
        url: String,
        /// Underlying connection error text.
        reason: String,
    },

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {status}: {body}")]
    Status {
        /// HTTP status code of the response.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Any other transport-level failure (protocol error, body read).
    #[error("transport error: {reason}")]
    Transport {
        /// Underlying error text.
        reason: String,
    },
}

impl GatewayError {
    /// Convenience constructor for configuration problems.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}
