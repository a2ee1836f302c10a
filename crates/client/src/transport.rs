//! Transport implementations — how a completion request reaches a model.
//!
//! `DirectTransport` speaks the OpenAI-compatible `/chat/completions`
//! wire format with a bearer credential. `RelayTransport` posts to the
//! Lustre relay's `/chat` endpoint and never sees a credential.

use async_trait::async_trait;
use lustre_config::{AppConfig, TransportMode};
use lustre_core::error::ClientError;
use lustre_core::message::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::ChatRequest;

/// How long we wait for the upstream before giving up. Matches the
/// underlying HTTP client convention used across this codebase.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A way to deliver a chat request and get back the reply text.
///
/// Implementations validate the response shape and map failures into
/// the `ClientError` taxonomy. They never retry: a failure surfaces
/// once per user action.
#[async_trait]
pub trait Transport: Send + Sync {
    /// A short name for logging ("direct", "relay").
    fn name(&self) -> &str;

    /// Send the request, returning the raw (untruncated) reply text.
    async fn send(&self, request: &ChatRequest) -> Result<String, ClientError>;
}

/// Build the transport selected by configuration.
pub fn build_transport(config: &AppConfig) -> Arc<dyn Transport> {
    match config.transport.mode {
        TransportMode::Relay => Arc::new(RelayTransport::new(&config.transport.relay_url)),
        TransportMode::Direct => Arc::new(DirectTransport::new(
            &config.transport.api_url,
            config.api_key.clone(),
        )),
    }
}

/// Map an upstream HTTP status into the error taxonomy.
fn map_error_status(status: u16) -> ClientError {
    match status {
        401 | 403 => ClientError::Auth("credential rejected by the completion endpoint".into()),
        429 => ClientError::RateLimited,
        500..=599 => ClientError::ServiceUnavailable {
            status_code: status,
        },
        other => ClientError::Unknown(format!("unexpected status {other}")),
    }
}

/// Map a transport-level (pre-status) failure.
fn map_request_error(err: reqwest::Error) -> ClientError {
    if err.is_connect() || err.is_timeout() {
        ClientError::NetworkUnavailable(err.to_string())
    } else {
        ClientError::Unknown(err.to_string())
    }
}

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
}

// --- Direct transport ---

/// Calls an OpenAI-compatible `/chat/completions` endpoint directly.
///
/// Requires a credential; the relay is the variant that keeps the
/// credential off end-user machines and is the default.
pub struct DirectTransport {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client: build_http_client(),
        }
    }

    fn to_api_messages(request: &ChatRequest) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ApiMessage {
            role: "system".into(),
            content: request.system_prompt.clone(),
        });
        for msg in &request.history {
            messages.push(ApiMessage {
                role: msg.role.as_str().into(),
                content: msg.content.clone(),
            });
        }
        messages.push(ApiMessage {
            role: "user".into(),
            content: request.user_message.content.clone(),
        });
        messages
    }
}

#[async_trait]
impl Transport for DirectTransport {
    fn name(&self) -> &str {
        "direct"
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let Some(api_key) = &self.api_key else {
            return Err(ClientError::Auth(
                "no API key configured for direct mode".into(),
            ));
        };

        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(request),
            "max_tokens": request.params.max_tokens,
            "temperature": request.params.temperature,
            "top_p": request.params.top_p,
            "frequency_penalty": request.params.frequency_penalty,
            "presence_penalty": request.params.presence_penalty,
        });

        debug!(model = %request.model, history = request.history.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Completion endpoint returned error");
            return Err(map_error_status(status));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(format!("unparseable body: {e}")))?;

        extract_reply(api_response)
    }
}

/// Validate the response shape: a non-empty choice list whose first
/// element carries non-empty message content. Anything else is a
/// `MalformedResponse`, never a panic.
fn extract_reply(response: ApiResponse) -> Result<String, ClientError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::MalformedResponse("no choices in response".into()))?;

    match choice.message.content {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ClientError::MalformedResponse(
            "choice has no message content".into(),
        )),
    }
}

// --- Relay transport ---

/// Calls the Lustre relay's `POST /chat` endpoint.
///
/// No credential leaves the client: the relay attaches its own key to
/// the upstream call.
pub struct RelayTransport {
    base_url: String,
    client: reqwest::Client,
}

impl RelayTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_http_client(),
        }
    }
}

#[async_trait]
impl Transport for RelayTransport {
    fn name(&self) -> &str {
        "relay"
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let url = format!("{}/chat", self.base_url);
        let body = RelayChatRequest {
            message: request.user_message.content.clone(),
            history: request
                .history
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect(),
        };

        debug!(history = body.history.len(), "Sending relayed completion request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Relay returned error");
            return Err(map_error_status(status));
        }

        let relay_response: RelayChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(format!("unparseable body: {e}")))?;

        if relay_response.reply.is_empty() {
            return Err(ClientError::MalformedResponse("empty reply from relay".into()));
        }

        Ok(relay_response.reply)
    }
}

// --- Relay wire types (shared with the relay server) ---

/// `POST /chat` request body.
///
/// `history` is omitted from the wire when empty, so a bare
/// `{"message": "..."}` body — the original relay contract — stays
/// valid in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<WireMessage>,
}

/// One prior turn carried over the relay wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// `POST /chat` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayChatResponse {
    pub reply: String,
}

/// `POST /chat` failure body (paired with a non-2xx status).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayErrorResponse {
    pub error: String,
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ApiReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenerationParams;
    use lustre_core::message::Message;

    fn request_with_history() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".into(),
            system_prompt: "You are a beauty assistant.".into(),
            history: vec![
                Message::user("best night cream?"),
                Message::assistant("Try a retinol-based one."),
            ],
            user_message: Message::user("and for sensitive skin?"),
            params: GenerationParams::default(),
        }
    }

    #[test]
    fn api_messages_lead_with_system_and_end_with_user() {
        let request = request_with_history();
        let messages = DirectTransport::to_api_messages(&request);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "and for sensitive skin?");
    }

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert!(matches!(map_error_status(401), ClientError::Auth(_)));
        assert!(matches!(map_error_status(403), ClientError::Auth(_)));
        assert!(matches!(map_error_status(429), ClientError::RateLimited));
        assert!(matches!(
            map_error_status(500),
            ClientError::ServiceUnavailable { status_code: 500 }
        ));
        assert!(matches!(
            map_error_status(503),
            ClientError::ServiceUnavailable { status_code: 503 }
        ));
        assert!(matches!(map_error_status(418), ClientError::Unknown(_)));
    }

    #[tokio::test]
    async fn direct_without_key_fails_before_any_network_call() {
        let transport = DirectTransport::new("https://api.example.com/v1", None);
        let err = transport.send(&request_with_history()).await.unwrap_err();
        assert!(matches!(err, ClientError::Auth(_)));
    }

    #[test]
    fn empty_key_is_treated_as_missing() {
        let transport = DirectTransport::new("https://api.example.com/v1", Some(String::new()));
        assert!(transport.api_key.is_none());
    }

    #[test]
    fn parse_completion_response() {
        let data = r#"{"choices":[{"message":{"role":"assistant","content":"Use SPF daily."}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Use SPF daily.")
        );
    }

    #[test]
    fn empty_choices_is_malformed_not_a_panic() {
        let parsed: ApiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_reply(parsed),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn choice_without_content_is_malformed() {
        let data = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(matches!(
            extract_reply(parsed),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn choice_with_empty_content_is_malformed() {
        let data = r#"{"choices":[{"message":{"role":"assistant","content":""}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(matches!(
            extract_reply(parsed),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn valid_choice_extracts_text() {
        let data = r#"{"choices":[{"message":{"role":"assistant","content":"Use SPF daily."}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(extract_reply(parsed).unwrap(), "Use SPF daily.");
    }

    #[test]
    fn relay_request_omits_empty_history() {
        let body = RelayChatRequest {
            message: "hello?".into(),
            history: vec![],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"message":"hello?"}"#);
    }

    #[test]
    fn relay_request_carries_history_roles() {
        let body = RelayChatRequest {
            message: "and for oily skin?".into(),
            history: vec![WireMessage {
                role: Role::Assistant,
                content: "Try a gel moisturizer.".into(),
            }],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
    }

    #[test]
    fn bare_message_body_still_deserializes() {
        let parsed: RelayChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(parsed.message, "hi");
        assert!(parsed.history.is_empty());
    }

    #[test]
    fn build_transport_honors_mode() {
        let mut config = AppConfig::default();
        assert_eq!(build_transport(&config).name(), "relay");

        config.transport.mode = TransportMode::Direct;
        assert_eq!(build_transport(&config).name(), "direct");
    }

    #[test]
    fn base_urls_are_normalized() {
        let transport = RelayTransport::new("http://127.0.0.1:3001/");
        assert_eq!(transport.base_url, "http://127.0.0.1:3001");
    }
}
