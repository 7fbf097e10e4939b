//! Policy error definitions.

use thiserror::Error;

/// Result alias for policy operations.
pub type PolicyResult<T> = std::result::Result<T, PolicyError>;

/// Errors raised while governing an outbound call.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The binding names a credential that the store cannot resolve.
    #[error("credential `{name}` is not configured")]
    MissingCredential {
        /// Name of the missing credential entry.
        name: String,
    },

    /// The target host matched no approved domain pattern.
    #[error("domain `{host}` is not on the approved list")]
    DomainNotAllowed {
        /// Host extracted from the request URL.
        host: String,
    },
}

impl PolicyError {
    /// Convenience constructor for a missing credential.
    #[must_use]
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential { name: name.into() }
    }

    /// Convenience constructor for a rejected host.
    #[must_use]
    pub fn domain_not_allowed(host: impl Into<String>) -> Self {
        Self::DomainNotAllowed { host: host.into() }
    }
}
