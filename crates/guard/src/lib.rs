//! Guardrail classification for Lustre Concierge.
//!
//! Decides, before any network call, whether a user message gets a
//! canned local answer (off-topic subject, competitor brand, medical
//! advice, plain greeting, prompt-injection attempt) or passes through
//! to the completion endpoint.

pub mod classifier;
pub mod vocabulary;

pub use classifier::{MatchMode, Rule, RuleCategory, RuleTable, Verdict};
