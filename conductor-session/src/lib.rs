//! Bounded per-session conversation history.
//!
//! Sessions are created lazily on first write, capped in both message count
//! and per-message length, and removed only by the explicit idle-expiry
//! sweep. The store deliberately does not serialize whole turns; see
//! [`SessionStore::replace`] for the concurrency contract.

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod message;
mod store;

/// History caps and the idle-expiry deadline.
pub use config::SessionConfig;
/// A single history entry and its speaker role.
pub use message::{Message, Role};
/// The process-wide session map.
pub use store::{SessionStats, SessionStore};
