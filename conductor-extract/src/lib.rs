//! Tool-call extraction from generated text.
//!
//! Model output carries tool invocations two ways: fenced blocks (with or
//! without a language tag) holding a `{"tool": ..., "params": ...}` object,
//! and bare
//! `name(key=value)` calls in free text for already-known tool names.
//! Fenced blocks go through an ordered list of parser strategies, from
//! strict parsing down to field scraping; a block that defeats every
//! strategy is dropped and the rest of the text is still honoured.
//! Extraction itself never fails.

#![warn(missing_docs, clippy::pedantic)]

mod bare;
mod extract;
mod fence;

/// The extractor and its configuration.
pub use extract::CallExtractor;
