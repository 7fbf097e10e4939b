//! Generation-service clients.
//!
//! The orchestrator talks to its language model through the
//! [`GenerationClient`] trait; this crate ships the OpenAI-compatible
//! implementation plus the shared HTTPS client it rides on. Each call is a
//! single blocking round trip that resolves to the full response text.

#![warn(missing_docs, clippy::pedantic)]

mod http_client;
mod openai;
mod traits;

/// Shared TLS-enabled hyper client, reused by the REST gateway.
pub use http_client::{build_https_client, build_https_client_with, HttpClientConfig, HyperClient};
/// The OpenAI-compatible client and its configuration.
pub use openai::{OpenAiClient, OpenAiConfig, OPENAI_API_KEY_ENV};
/// Client trait, request/response types, and the adapter error taxonomy.
pub use traits::{
    AdapterError, AdapterMetadata, AdapterResult, Completion, CompletionRequest, GenerationClient,
    MessageRole, PromptMessage,
};
