//! The per-session turn engine for Lustre Concierge.
//!
//! A `Session` owns everything one conversation needs: the guardrail
//! rule table, the bounded context window, and the completion client.
//! There are no process-wide globals — callers create a session and
//! drive it one turn at a time.

pub mod turn;

pub use turn::{Session, TurnOutcome, TurnPhase};
