//! # Lustre Core
//!
//! Domain types, traits, and error definitions for the Lustre
//! Concierge chat assistant. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Seams are traits defined where they are consumed or here in core.
//! Implementations live in their respective crates, which enables
//! swapping via configuration and easy testing with stubs. All crates
//! depend inward on core.

pub mod error;
pub mod message;
pub mod render;

// Re-export key types at crate root for ergonomics
pub use error::ClientError;
pub use message::{Message, Role, SessionId};
pub use render::RenderSink;
