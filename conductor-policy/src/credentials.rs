//! Credential resolution for outbound calls.

use std::collections::HashMap;

/// Resolves named secrets at call time.
///
/// Dynamic tool bindings reference credentials by name only; the concrete
/// value is looked up when the call is made, so rotating a secret never
/// requires touching the registry.
pub trait CredentialStore: Send + Sync {
    /// Returns the secret registered under `name`, if any.
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Credential store backed by process environment variables.
///
/// Empty and whitespace-only values are treated as unset so a blank entry in
/// a deployment manifest reads as a missing credential rather than an empty
/// secret.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Creates the environment-backed store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CredentialStore for EnvCredentials {
    fn resolve(&self, name: &str) -> Option<String> {
        let value = std::env::var(name).ok()?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Fixed in-memory credential store for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a credential, replacing any previous value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn resolve(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
