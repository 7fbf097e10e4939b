//! Seam between the tool layer and the outbound HTTP caller.

use async_trait::async_trait;
use conductor_primitives::ToolOutcome;
use serde_json::{Map, Value};

use crate::binding::HttpBinding;

/// Generic caller that takes a dynamic binding and its parameters to the
/// network.
///
/// Implemented by the gateway crate; the tool layer only sees the result
/// envelope. Implementations never return an error: policy rejections,
/// missing credentials, timeouts, and upstream failures all arrive as
/// `success=false` envelopes with distinct messages.
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// Issues the bound request and classifies the response.
    async fn invoke(&self, binding: &HttpBinding, params: &Map<String, Value>) -> ToolOutcome;
}
