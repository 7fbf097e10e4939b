//! The conversation driver.
//!
//! One user turn runs a fixed two-pass protocol: build a prompt from the
//! system instructions, the tool catalog, and the session history; let the
//! model answer; extract whatever tool calls that answer embeds; execute
//! them in order; and, when any ran, make a second call that folds the
//! results into the final answer. Tool failures travel back to the model as
//! ordinary data. Only a failure of the generation service itself reaches
//! the caller, and then as a polite canned reply flagged with `error`.

#![warn(missing_docs, clippy::pedantic)]

mod engine;
mod phase;
mod prompt;

/// The orchestrator, its configuration, and the chat/catalog operations.
pub use engine::{CatalogListing, ChatEngine, ChatReply, ChatRequest, ChatTurn, EngineConfig};
/// Turn phases and the per-turn trace.
pub use phase::{TurnPhase, TurnTrace};
