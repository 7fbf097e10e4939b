//! Outbound-call governance for the Conductor runtime.
//!
//! Every HTTP request a dynamic tool makes passes through a [`DomainPolicy`]:
//! the target host must match an approved domain pattern, and the matching
//! rule says how the domain's credential is injected. Credentials themselves
//! are resolved by name through a [`CredentialStore`] at call time.

#![warn(missing_docs, clippy::pedantic)]

mod credentials;
mod domain;
mod error;

/// Credential resolution seam plus the environment-backed and static stores.
pub use credentials::{CredentialStore, EnvCredentials, StaticCredentials};
/// Allow-list types and the per-domain auth rules.
pub use domain::{AuthRule, DomainDecision, DomainPolicy, DomainRule};
/// Error type and result alias for policy failures.
pub use error::{PolicyError, PolicyResult};
