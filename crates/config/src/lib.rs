//! Configuration loading, validation, and management for Lustre Concierge.
//!
//! Loads configuration from `~/.lustre/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.lustre/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key. Only the process running the direct transport
    /// (the relay, or a direct-mode chat client) ever needs this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// Generation parameters sent with every completion request
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Transport selection: relayed (default) or direct
    #[serde(default)]
    pub transport: TransportConfig,

    /// Input / reply / context-window bounds
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Guardrail classifier configuration
    #[serde(default)]
    pub guard: GuardConfig,

    /// Relay server configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Chat front-end configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_model() -> String {
    "gpt-4o".into()
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("generation", &self.generation)
            .field("transport", &self.transport)
            .field("limits", &self.limits)
            .field("guard", &self.guard)
            .field("relay", &self.relay)
            .field("chat", &self.chat)
            .finish()
    }
}

/// Generation parameters — product-tuning constants, overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub frequency_penalty: f32,

    #[serde(default)]
    pub presence_penalty: f32,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    1.0
}
fn default_max_tokens() -> u32 {
    500
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Which transport the chat client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Call the relay, which holds the provider credential (default)
    Relay,
    /// Call the provider directly with a local credential
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_transport_mode")]
    pub mode: TransportMode,

    /// Base URL of the relay (relayed mode)
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Base URL of the provider API (direct mode and the relay itself)
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_transport_mode() -> TransportMode {
    TransportMode::Relay
}
fn default_relay_url() -> String {
    "http://127.0.0.1:3001".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: default_transport_mode(),
            relay_url: default_relay_url(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Longest user message accepted, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Longest reply displayed before truncation, in characters
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,

    /// Number of prior messages kept for conversational continuity
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_max_input_chars() -> usize {
    1000
}
fn default_max_reply_chars() -> usize {
    1500
}
fn default_context_window() -> usize {
    10
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            max_reply_chars: default_max_reply_chars(),
            context_window: default_context_window(),
        }
    }
}

/// Guardrail classifier configuration.
///
/// The matching vocabulary and canned replies are data, not code:
/// each override replaces the built-in patterns and/or reply for one
/// category. Categories keep their fixed priority order regardless of
/// the order overrides appear in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Brand name woven into the system prompt and canned replies
    #[serde(default = "default_brand")]
    pub brand: String,

    /// Per-category vocabulary / reply overrides
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_true() -> bool {
    true
}
fn default_brand() -> String {
    "Lustre".into()
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            brand: default_brand(),
            rules: vec![],
        }
    }
}

/// Override for one classifier category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// One of: "off_topic", "competitor", "medical", "greeting",
    /// "prompt_injection"
    pub category: String,

    /// Replacement pattern list (empty = keep built-in patterns)
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Replacement canned reply (None = keep built-in reply)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_relay_host")]
    pub host: String,

    #[serde(default = "default_relay_port")]
    pub port: u16,

    /// CORS origins allowed to call the relay. Empty = allow any
    /// origin, matching the permissive default of the original proxy.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_relay_host() -> String {
    "127.0.0.1".into()
}
fn default_relay_port() -> u16 {
    3001
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            port: default_relay_port(),
            allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Whether assistant replies use the character-by-character reveal
    #[serde(default = "default_true")]
    pub typing_effect: bool,

    /// Delay between revealed characters, in milliseconds
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,

    /// Override the system prompt entirely (skips brand templating)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_reveal_delay_ms() -> u64 {
    12
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_effect: true,
            reveal_delay_ms: default_reveal_delay_ms(),
            system_prompt: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.lustre/config.toml).
    ///
    /// Environment variable overrides, highest priority first:
    /// - `LUSTRE_API_KEY`, then `OPENAI_API_KEY` for the credential
    /// - `LUSTRE_MODEL` for the completion model
    /// - `LUSTRE_TRANSPORT` ("relay" or "direct")
    /// - `LUSTRE_RELAY_URL` for the relay endpoint
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("LUSTRE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("LUSTRE_MODEL") {
            config.model = model;
        }

        if let Ok(mode) = std::env::var("LUSTRE_TRANSPORT") {
            config.transport.mode = match mode.as_str() {
                "direct" => TransportMode::Direct,
                _ => TransportMode::Relay,
            };
        }

        if let Ok(url) = std::env::var("LUSTRE_RELAY_URL") {
            config.transport.relay_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lustre")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(self.generation.top_p > 0.0 && self.generation.top_p <= 1.0) {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.limits.context_window == 0 {
            return Err(ConfigError::ValidationError(
                "limits.context_window must be at least 1".into(),
            ));
        }

        if self.limits.max_reply_chars == 0 || self.limits.max_input_chars == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_reply_chars and limits.max_input_chars must be at least 1".into(),
            ));
        }

        for rule in &self.guard.rules {
            if !matches!(
                rule.category.as_str(),
                "off_topic" | "competitor" | "medical" | "greeting" | "prompt_injection"
            ) {
                return Err(ConfigError::ValidationError(format!(
                    "unknown guard rule category '{}'",
                    rule.category
                )));
            }
        }

        Ok(())
    }

    /// The brand-scoped system prompt sent with every request.
    ///
    /// `chat.system_prompt` overrides the template entirely.
    pub fn system_prompt(&self) -> String {
        if let Some(prompt) = &self.chat.system_prompt {
            return prompt.clone();
        }
        let brand = &self.guard.brand;
        format!(
            "You are a helpful assistant for {brand}. Only answer questions about {brand} \
             products, beauty routines, recommendations, or beauty-related topics. If a \
             question is not related to these, politely refuse to answer and explain that \
             you can only help with {brand} and beauty topics."
        )
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            generation: GenerationConfig::default(),
            transport: TransportConfig::default(),
            limits: LimitsConfig::default(),
            guard: GuardConfig::default(),
            relay: RelayConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
