//! Tool-name validation shared by the registry and the dynamic-tool creator.

use crate::error::{Error, Result};

/// Maximum accepted length for a tool name.
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Validates a tool name against the registry's naming rules.
///
/// Names must be non-empty, at most [`MAX_TOOL_NAME_LEN`] characters, and
/// consist of ASCII alphanumerics and underscores only. The same rule applies
/// to static and dynamic tools so both catalogs stay addressable from the
/// embedded wire format.
///
/// # Errors
///
/// Returns [`Error::InvalidToolName`] describing the first rule violated.
pub fn validate_tool_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidToolName {
            name: String::new(),
            reason: "name cannot be empty".into(),
        });
    }

    if name.len() > MAX_TOOL_NAME_LEN {
        return Err(Error::InvalidToolName {
            name: name.into(),
            reason: format!("name length must be <= {MAX_TOOL_NAME_LEN}"),
        });
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::InvalidToolName {
            name: name.into(),
            reason: "name must contain only alphanumeric characters and underscores".into(),
        });
    }

    Ok(())
}
