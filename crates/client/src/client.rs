//! The completion client proper.
//!
//! Owns the generation parameters and the display truncation policy.
//! Transport selection is injected, so the same client logic serves
//! the relayed and direct variants unchanged.

use std::sync::Arc;

use lustre_config::{AppConfig, GenerationConfig};
use lustre_core::error::ClientError;
use lustre_core::message::Message;
use tracing::debug;

use crate::transport::Transport;

/// Appended when a reply is cut at the display limit.
pub const TRUNCATION_NOTICE: &str = "… (message shortened)";

/// Generation parameters sent with every request.
///
/// The defaults are product-tuning constants, not structure.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 500,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }
}

/// A complete chat-completion request. Constructed fresh per call and
/// never persisted; the system prompt is injected here, not stored in
/// the context window.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub history: Vec<Message>,
    pub user_message: Message,
    pub params: GenerationParams,
}

/// Sends chat requests and applies the reply-length policy.
pub struct CompletionClient {
    transport: Arc<dyn Transport>,
    model: String,
    params: GenerationParams,
    max_reply_chars: usize,
}

impl CompletionClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        model: impl Into<String>,
        params: GenerationParams,
        max_reply_chars: usize,
    ) -> Self {
        Self {
            transport,
            model: model.into(),
            params,
            max_reply_chars,
        }
    }

    /// Build a client straight from application config.
    pub fn from_config(config: &AppConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            transport,
            config.model.clone(),
            GenerationParams::from(&config.generation),
            config.limits.max_reply_chars,
        )
    }

    /// Send one completion request and return the display-ready reply.
    ///
    /// Suspends the calling task until the transport resolves; no
    /// retry, no cancellation. Truncation is applied here exactly once
    /// — transports and the relay always pass full text through.
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: Vec<Message>,
        user_message: Message,
    ) -> Result<String, ClientError> {
        let request = ChatRequest {
            model: self.model.clone(),
            system_prompt: system_prompt.to_string(),
            history,
            user_message,
            params: self.params.clone(),
        };

        let reply = self.transport.send(&request).await?;
        debug!(
            transport = self.transport.name(),
            chars = reply.chars().count(),
            "Completion received"
        );

        Ok(truncate_reply(reply, self.max_reply_chars))
    }
}

/// Cap a reply at `max_chars` characters, appending the fixed notice
/// when anything was cut. Character-based, so multi-byte text never
/// splits mid-glyph.
fn truncate_reply(reply: String, max_chars: usize) -> String {
    if reply.chars().count() <= max_chars {
        return reply;
    }

    let mut cut: String = reply.chars().take(max_chars).collect();
    cut.push_str(TRUNCATION_NOTICE);
    cut
}
