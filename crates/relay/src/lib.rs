//! HTTP relay for Lustre Concierge.
//!
//! Holds the provider credential server-side so browser and CLI
//! clients never see it, and forwards chat requests to the completion
//! endpoint. Exposes:
//!
//! - `POST /chat` — `{message, history?}` → `{reply}` or `{error}`
//! - `GET /health` — liveness probe
//!
//! The relay validates input bounds and maps upstream failures to
//! status codes, but never truncates replies: the display-length
//! policy is applied once, client-side.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use lustre_client::{
    ChatRequest, DirectTransport, GenerationParams, RelayChatRequest, RelayChatResponse,
    RelayErrorResponse, Transport,
};
use lustre_config::AppConfig;
use lustre_core::error::ClientError;
use lustre_core::message::{Message, Role};

/// Shared application state for the relay.
pub struct RelayState {
    pub transport: Arc<dyn Transport>,
    pub system_prompt: String,
    pub model: String,
    pub params: GenerationParams,
    pub max_input_chars: usize,
}

type SharedState = Arc<RelayState>;

/// Build the Axum router with all relay routes.
pub fn build_router(state: SharedState, allowed_origins: &[String]) -> Router {
    let cors = cors_layer(allowed_origins);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS policy: any origin when none are configured (the original
/// proxy's permissive default), exact origins otherwise.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the relay HTTP server.
pub async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.relay.host, config.relay.port);

    let transport: Arc<dyn Transport> = Arc::new(DirectTransport::new(
        &config.transport.api_url,
        config.api_key.clone(),
    ));

    if !config.has_api_key() {
        warn!("No API key configured — /chat will answer with an auth error");
    }

    let state = Arc::new(RelayState {
        transport,
        system_prompt: config.system_prompt(),
        model: config.model.clone(),
        params: GenerationParams::from(&config.generation),
        max_input_chars: config.limits.max_input_chars,
    });

    let app = build_router(state, &config.relay.allowed_origins);

    info!(addr = %addr, model = %config.model, "Relay starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

type ChatError = (StatusCode, Json<RelayErrorResponse>);

fn reject(status: StatusCode, error: impl Into<String>) -> ChatError {
    (
        status,
        Json(RelayErrorResponse {
            error: error.into(),
        }),
    )
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RelayChatRequest>,
) -> Result<Json<RelayChatResponse>, ChatError> {
    let message = payload.message.trim();

    if message.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    if message.chars().count() > state.max_input_chars {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            format!("message exceeds {} characters", state.max_input_chars),
        ));
    }

    // System entries are never accepted over the wire; the relay's own
    // prompt is injected fresh into every upstream request.
    let history: Vec<Message> = payload
        .history
        .iter()
        .filter_map(|m| match m.role {
            Role::User => Some(Message::user(&m.content)),
            Role::Assistant => Some(Message::assistant(&m.content)),
            Role::System => None,
        })
        .collect();

    let request = ChatRequest {
        model: state.model.clone(),
        system_prompt: state.system_prompt.clone(),
        history,
        user_message: Message::user(message),
        params: state.params.clone(),
    };

    match state.transport.send(&request).await {
        Ok(reply) => Ok(Json(RelayChatResponse { reply })),
        Err(e) => {
            warn!(error = %e, "Upstream completion failed");
            Err(reject(error_status(&e), e.user_message()))
        }
    }
}

/// Map a client error to the relay's response status.
fn error_status(err: &ClientError) -> StatusCode {
    match err {
        ClientError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ClientError::Auth(_) => StatusCode::BAD_GATEWAY,
        ClientError::ServiceUnavailable { .. } => StatusCode::BAD_GATEWAY,
        ClientError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        ClientError::NetworkUnavailable(_) => StatusCode::GATEWAY_TIMEOUT,
        ClientError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
