//! History entry types.

use serde::{Deserialize, Serialize};

/// Speaker of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Text sent by the end user.
    User,
    /// Text produced by the generation service.
    Assistant,
}

impl Role {
    /// Wire-format label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry in a session's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates an entry with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Speaker of this entry.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Entry text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Entry size in characters.
    #[must_use]
    pub fn chars(&self) -> usize {
        self.content.chars().count()
    }
}
