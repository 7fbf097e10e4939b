//! The generic outbound caller behind every dynamic tool.
//!
//! A dynamic tool is just an [`HttpBinding`](conductor_tools::HttpBinding);
//! the gateway is what takes it to the network. Each call is checked against
//! the domain allow-list, gets its credential injected per the matching auth
//! rule, runs under a fixed timeout, and has its response classified into the
//! uniform result envelope. Timeouts, connection failures, and non-2xx
//! responses stay distinguishable all the way into the envelope text.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod gateway;
mod request;

/// Gateway error taxonomy and result alias.
pub use error::{GatewayError, GatewayResult};
/// The policy-enforcing outbound caller.
pub use gateway::{RestGateway, DEFAULT_CALL_TIMEOUT};
