//! Completion client for Lustre Concierge.
//!
//! Builds the chat-completion request (system prompt + context window
//! + new message + generation parameters), sends it over one of two
//! transports, validates the response shape, and applies the display
//! truncation policy.
//!
//! Transports:
//! - **relay** (default): calls the Lustre relay, which holds the
//!   provider credential server-side
//! - **direct**: calls the provider API with a local credential
//!
//! The request shape, validation, and truncation are identical for
//! both; only the endpoint and credential handling differ.

pub mod client;
pub mod transport;

pub use client::{ChatRequest, CompletionClient, GenerationParams, TRUNCATION_NOTICE};
pub use transport::{
    DirectTransport, RelayChatRequest, RelayChatResponse, RelayErrorResponse, RelayTransport,
    Transport, WireMessage, build_transport,
};
