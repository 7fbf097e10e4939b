//! HTTP bindings backing dynamic tools.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use conductor_primitives::ToolOutcome;
use serde::{Deserialize, Serialize};

use crate::tool::{ToolError, ToolResult};

/// HTTP method a binding uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindMethod {
    /// Parameters travel in the query string.
    #[default]
    Get,
    /// Parameters travel as a JSON body.
    Post,
    /// Parameters travel as a JSON body.
    Put,
    /// Parameters travel in the query string.
    Delete,
}

impl BindMethod {
    /// Uppercase method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether parameters are sent as a JSON request body.
    #[must_use]
    pub fn sends_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl Display for BindMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindMethod {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(ToolError::InvalidSpec {
                reason: format!("unsupported HTTP method `{other}`"),
            }),
        }
    }
}

/// Endpoint description for a dynamic tool.
///
/// Created once by the runtime tool creator and then immutable; bindings live
/// for the process lifetime and are lost on restart, which is intentional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpBinding {
    base_url: String,
    endpoint: String,
    method: BindMethod,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    optional: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_test: Option<ToolOutcome>,
}

impl HttpBinding {
    /// Creates a binding after validating the URL parts.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidSpec`] if the base URL does not carry an
    /// http or https scheme.
    pub fn new(
        base_url: impl Into<String>,
        endpoint: impl Into<String>,
        method: BindMethod,
    ) -> ToolResult<Self> {
        let base_url = sanitize_base_url(&base_url.into())?;

        let endpoint = endpoint.into();
        let endpoint = if endpoint.starts_with('/') {
            endpoint
        } else {
            format!("/{endpoint}")
        };

        Ok(Self {
            base_url,
            endpoint,
            method,
            required: Vec::new(),
            optional: Vec::new(),
            credential: None,
            self_test: None,
        })
    }

    /// Sets the required parameter names.
    #[must_use]
    pub fn with_required(mut self, required: Vec<String>) -> Self {
        self.required = required;
        self
    }

    /// Sets the optional parameter names.
    #[must_use]
    pub fn with_optional(mut self, optional: Vec<String>) -> Self {
        self.optional = optional;
        self
    }

    /// Names the credential-store entry injected on each call.
    #[must_use]
    pub fn with_credential(mut self, name: impl Into<String>) -> Self {
        self.credential = Some(name.into());
        self
    }

    /// Caches the envelope returned by a passing registration self-test.
    #[must_use]
    pub fn with_self_test(mut self, outcome: ToolOutcome) -> Self {
        self.self_test = Some(outcome);
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint path with a leading slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> BindMethod {
        self.method
    }

    /// Required parameter names.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Optional parameter names.
    #[must_use]
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// Credential-store entry name, when the endpoint needs one.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Cached self-test envelope from registration, when one ran.
    #[must_use]
    pub fn self_test(&self) -> Option<&ToolOutcome> {
        self.self_test.as_ref()
    }

    /// Full target URL before auth injection.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }
}

fn sanitize_base_url(base_url: &str) -> ToolResult<String> {
    let trimmed = base_url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ToolError::InvalidSpec {
            reason: "base url must start with http:// or https://".into(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
