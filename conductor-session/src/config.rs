//! Session store configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

/// Caps applied to every session plus the idle-expiry deadline.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    max_messages: NonZeroUsize,
    max_message_chars: NonZeroUsize,
    idle_ttl: Duration,
}

impl SessionConfig {
    /// Sets the maximum number of retained messages per session.
    #[must_use]
    pub fn with_max_messages(mut self, max_messages: NonZeroUsize) -> Self {
        self.max_messages = max_messages;
        self
    }

    /// Sets the per-message character cap applied on write.
    #[must_use]
    pub fn with_max_message_chars(mut self, max_message_chars: NonZeroUsize) -> Self {
        self.max_message_chars = max_message_chars;
        self
    }

    /// Sets how long a session may sit untouched before an expiry sweep
    /// removes it.
    #[must_use]
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Maximum number of retained messages per session.
    #[must_use]
    pub const fn max_messages(self) -> NonZeroUsize {
        self.max_messages
    }

    /// Per-message character cap.
    #[must_use]
    pub const fn max_message_chars(self) -> NonZeroUsize {
        self.max_message_chars
    }

    /// Idle duration after which a session is eligible for expiry.
    #[must_use]
    pub const fn idle_ttl(self) -> Duration {
        self.idle_ttl
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_messages: NonZeroUsize::new(20).expect("non-zero"),
            max_message_chars: NonZeroUsize::new(4000).expect("non-zero"),
            idle_ttl: Duration::from_secs(30 * 60),
        }
    }
}
