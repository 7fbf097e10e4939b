//! Tool parameter schemas and catalog rendering.

use std::fmt::Write as _;

use conductor_primitives::validate_tool_name;
use serde::{Deserialize, Serialize};

use crate::tool::{ToolError, ToolResult};

/// Declared type of a tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Free-form text.
    String,
    /// Whole number.
    Integer,
    /// Floating-point number.
    Float,
    /// True or false.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl ParamKind {
    /// Catalog label for the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// One declared parameter of a tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    description: String,
    #[serde(default)]
    required: bool,
}

impl ParamSpec {
    /// Creates an optional parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        }
    }

    /// Marks the parameter as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the parameter must be supplied.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Schema of one registered tool: name, description, and parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    name: String,
    description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    params: Vec<ParamSpec>,
}

impl ToolSpec {
    /// Creates a spec after validating the name and description.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidName`] for a malformed name and
    /// [`ToolError::InvalidSpec`] for an empty description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> ToolResult<Self> {
        let name = name.into();
        validate_tool_name(&name)?;

        let description = description.into();
        if description.trim().is_empty() {
            return Err(ToolError::InvalidSpec {
                reason: "tool description cannot be empty".into(),
            });
        }

        Ok(Self {
            name,
            description,
            params: Vec::new(),
        })
    }

    /// Appends a declared parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Names of the required parameters.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.is_required())
            .map(ParamSpec::name)
    }

    /// Renders the spec as catalog text for the model-facing system prompt.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = format!("- {}: {}", self.name, self.description);
        for param in &self.params {
            let requirement = if param.is_required() {
                ", required"
            } else {
                ""
            };
            let _ = write!(
                out,
                "\n    {} ({}{}): {}",
                param.name,
                param.kind.as_str(),
                requirement,
                param.description
            );
        }
        out
    }
}
