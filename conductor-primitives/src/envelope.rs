//! The uniform result envelope produced by every tool invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single tool invocation.
///
/// Every handler resolves to this shape, success or failure; the executor
/// never lets a tool error escape as anything else. Failed envelopes are fed
/// back to the model as ordinary data so it can explain the failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "OutcomeMeta::is_empty")]
    metadata: OutcomeMeta,
}

impl ToolOutcome {
    /// Creates a successful envelope carrying the given payload.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: OutcomeMeta::default(),
        }
    }

    /// Creates a failed envelope carrying a descriptive message.
    #[must_use]
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: OutcomeMeta::default(),
        }
    }

    /// Attaches response metadata to the envelope.
    #[must_use]
    pub fn with_metadata(mut self, metadata: OutcomeMeta) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the invocation succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    /// Payload produced by a successful invocation.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Message describing a failed invocation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Response metadata captured alongside the payload.
    #[must_use]
    pub fn metadata(&self) -> &OutcomeMeta {
        &self.metadata
    }
}

/// Transport-level metadata attached to an invocation outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

impl OutcomeMeta {
    /// Records the upstream HTTP status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Records the size of the raw payload in bytes.
    #[must_use]
    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.bytes = Some(bytes);
        self
    }

    /// Records the upstream content-type hint.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Upstream HTTP status code, when the invocation went over HTTP.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Raw payload size in bytes, when known.
    #[must_use]
    pub fn bytes(&self) -> Option<usize> {
        self.bytes
    }

    /// Content-type hint for non-JSON payloads.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether no metadata was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.bytes.is_none() && self.content_type.is_none()
    }
}
