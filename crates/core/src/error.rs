//! Error types for the Lustre Concierge domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The completion
//! client surfaces one of six kinds; each kind maps to exactly one
//! fixed user-facing sentence so the turn boundary never leaks status
//! codes, upstream bodies, or stack traces to the user.

use thiserror::Error;

/// Failures surfaced by the completion client.
///
/// Mapping rules, applied in the transports:
/// - HTTP 401/403 → `Auth`
/// - HTTP 429 → `RateLimited`
/// - HTTP 5xx → `ServiceUnavailable`
/// - connect / timeout / DNS failures → `NetworkUnavailable`
/// - unparseable body, empty choices, empty reply → `MalformedResponse`
/// - everything else → `Unknown`
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by the completion endpoint")]
    RateLimited,

    #[error("Completion endpoint unavailable (status: {status_code})")]
    ServiceUnavailable { status_code: u16 },

    #[error("Network error: {0}")]
    NetworkUnavailable(String),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ClientError {
    /// The fixed sentence shown to the user for this error kind.
    ///
    /// One sentence per kind, never the raw error. A failure is
    /// surfaced once per submitted message; the user resubmits.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::Auth(_) => {
                "The assistant isn't configured correctly right now. Please try again later."
            }
            ClientError::RateLimited => {
                "The assistant is handling a lot of requests right now. Please wait a moment and resend your message."
            }
            ClientError::ServiceUnavailable { .. } => {
                "The assistant service is temporarily unavailable. Please try again shortly."
            }
            ClientError::NetworkUnavailable(_) => {
                "We couldn't reach the assistant. Please check your connection and try again."
            }
            ClientError::MalformedResponse(_) => {
                "The assistant sent back something we couldn't read. Please resend your message."
            }
            ClientError::Unknown(_) => {
                "Sorry, there was a problem connecting to the assistant."
            }
        }
    }
}
