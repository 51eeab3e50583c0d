//! HTTP API gateway for Deckhand.
//!
//! Exposes the deck generator to a browser frontend:
//! - `GET /` service banner
//! - `GET /health` liveness probe
//! - `POST /generate-presentation` runs one generation end to end
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use deckhand_agent::{AgentLoop, GenerationOutput};
use deckhand_config::AppConfig;
use deckhand_core::error::AgentError;
use deckhand_core::event::EventBus;
use deckhand_core::gateway::{PresentationGateway, SharingGateway};
use deckhand_google::{GoogleDriveGateway, GoogleSlidesGateway};
use deckhand_providers::AnthropicProvider;

/// Shared application state for the gateway.
///
/// Starting without credentials is allowed so that `/health` still answers;
/// generation requests then fail with the recorded reason.
#[derive(Clone)]
pub struct GatewayState {
    agent: Result<Arc<AgentLoop>, String>,
}

impl GatewayState {
    pub fn new(agent: Arc<AgentLoop>) -> Self {
        Self { agent: Ok(agent) }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            agent: Err(reason.into()),
        }
    }

    /// Wire the Anthropic provider and the Google gateways from `config`.
    pub fn from_config(config: &AppConfig, event_bus: Arc<EventBus>) -> Self {
        let gateways = GoogleSlidesGateway::from_config(config).and_then(|slides| {
            GoogleDriveGateway::from_config(config).map(|drive| (slides, drive))
        });
        let (slides, drive) = match gateways {
            Ok(pair) => pair,
            Err(e) => return Self::unavailable(e.to_string()),
        };
        match build_agent(config, Arc::new(slides), Arc::new(drive), event_bus) {
            Ok(agent) => Self::new(Arc::new(agent)),
            Err(reason) => Self::unavailable(reason),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.agent.is_ok()
    }
}

/// Build a driver from `config` over the given gateways.
///
/// Fails only when the model provider has no credentials.
pub fn build_agent(
    config: &AppConfig,
    slides: Arc<dyn PresentationGateway>,
    sharing: Arc<dyn SharingGateway>,
    event_bus: Arc<EventBus>,
) -> Result<AgentLoop, String> {
    let provider = AnthropicProvider::from_config(config).map_err(|e| e.to_string())?;
    Ok(AgentLoop::new(
        Arc::new(provider),
        slides,
        sharing,
        &config.agent.model,
        config.agent.temperature,
        event_bus,
    )
    .with_max_iterations(config.agent.max_iterations)
    .with_max_tokens(config.agent.max_tokens))
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS limited to `allowed_origins`
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: GatewayState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/generate-presentation", post(generate_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    if let Some(warning) = shared_template_warning(&config) {
        warn!("{warning}");
    }

    let event_bus = Arc::new(EventBus::default());
    let state = GatewayState::from_config(&config, event_bus);
    if let Err(reason) = &state.agent {
        warn!(reason = %reason, "Generator unavailable; /generate-presentation will fail");
    }

    let app = build_router(state, &config.server.cors_origins());

    info!(addr = %addr, model = %config.agent.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// A configured template deck is shared by every request the server handles.
fn shared_template_warning(config: &AppConfig) -> Option<String> {
    config.google.template_presentation_id.as_deref().map(|id| {
        format!(
            "Template presentation {id} is reset by every request; \
             concurrent generations will overwrite each other"
        )
    })
}

#[derive(Serialize)]
struct BannerResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

async fn root_handler() -> Json<BannerResponse> {
    Json(BannerResponse {
        status: "ok",
        message: "Deckhand presentation generator API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct GenerateRequest {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    presentation_id: String,
    shareable_link: String,
    title: String,
    slide_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

impl From<GenerationOutput> for GenerateResponse {
    fn from(output: GenerationOutput) -> Self {
        Self {
            presentation_id: output.document_id,
            shareable_link: output.share_link,
            title: output.title,
            slide_count: output.slide_count,
            warning: output.warning,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn error_response(status: StatusCode, error: &str, detail: Option<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            detail,
        }),
    )
        .into_response()
}

async fn generate_handler(
    State(state): State<GatewayState>,
    Json(payload): Json<GenerateRequest>,
) -> Response {
    let prompt = payload.prompt.trim();
    if prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "prompt must not be empty", None);
    }

    let agent = match &state.agent {
        Ok(agent) => agent.clone(),
        Err(reason) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initialize services",
                Some(reason.clone()),
            );
        }
    };

    info!(prompt_len = prompt.len(), "Generation requested");

    match agent.run(prompt).await {
        Ok(output) => (StatusCode::OK, Json(GenerateResponse::from(output))).into_response(),
        Err(e) => {
            error!(error = %e, "Generation failed");
            match e {
                // Transport bodies stay in the log.
                AgentError::Provider { .. } => error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The language model request failed",
                    None,
                ),
                other => error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Presentation generation failed",
                    Some(other.to_string()),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use deckhand_core::error::ProviderError;
    use deckhand_core::message::MessageToolCall;
    use deckhand_core::provider::{Provider, ProviderRequest, ProviderResponse, ResponseBlock};
    use deckhand_tools::{InMemoryPresentations, InMemorySharing};
    use http_body_util::BodyExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(reply(vec![ResponseBlock::Text {
                    text: "done".into(),
                }]))
            })
        }
    }

    fn reply(blocks: Vec<ResponseBlock>) -> ProviderResponse {
        ProviderResponse {
            id: "msg_test".into(),
            blocks,
            usage: None,
            model: "mock-model".into(),
            stop_reason: None,
        }
    }

    fn tool(id: &str, name: &str, arguments: &str) -> ResponseBlock {
        ResponseBlock::ToolUse {
            call: MessageToolCall {
                id: id.into(),
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    fn state_with(replies: Vec<Result<ProviderResponse, ProviderError>>) -> GatewayState {
        let provider = Arc::new(ScriptedProvider {
            replies: Mutex::new(replies.into()),
        });
        let agent = AgentLoop::new(
            provider,
            Arc::new(InMemoryPresentations::new()),
            Arc::new(InMemorySharing::new()),
            "mock-model",
            0.7,
            Arc::new(EventBus::default()),
        )
        .with_max_iterations(3);
        GatewayState::new(Arc::new(agent))
    }

    fn app(state: GatewayState) -> Router {
        build_router(state, &["http://localhost:5173".to_string()])
    }

    fn post_generate(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate-presentation")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app(state_with(vec![])).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn root_banner() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(state_with(vec![])).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn generate_returns_shared_deck() {
        let state = state_with(vec![Ok(reply(vec![
            tool("c1", "initialize_document", r#"{"title":"Rust"}"#),
            tool(
                "c2",
                "insert_slide",
                r#"{"layout":"TITLE","title":"Rust","body":""}"#,
            ),
            tool("c3", "finalize_document", "{}"),
        ]))]);

        let response = app(state)
            .oneshot(post_generate(r#"{"prompt":"rust"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["presentation_id"], "doc-1");
        assert_eq!(body["shareable_link"], "memory://presentations/doc-1");
        assert_eq!(body["title"], "Rust");
        assert_eq!(body["slide_count"], 1);
        assert!(body.get("warning").is_none());
    }

    #[tokio::test]
    async fn auto_finalized_deck_carries_warning() {
        let state = state_with(vec![Ok(reply(vec![
            tool("c1", "initialize_document", r#"{"title":"Deck"}"#),
            tool(
                "c2",
                "insert_slide",
                r#"{"layout":"TITLE_AND_BODY","title":"One","body":"a"}"#,
            ),
        ]))]);

        let response = app(state)
            .oneshot(post_generate(r#"{"prompt":"deck"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["warning"].as_str().unwrap().contains("Max iterations"));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let response = app(state_with(vec![]))
            .oneshot(post_generate(r#"{"prompt":"   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_failure_hides_transport_detail() {
        let state = state_with(vec![Err(ProviderError::ApiError {
            status_code: 500,
            message: "upstream secret body".into(),
        })]);

        let response = app(state)
            .oneshot(post_generate(r#"{"prompt":"x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body.get("detail").is_none());
        assert!(!body.to_string().contains("upstream secret body"));
    }

    #[tokio::test]
    async fn exhaustion_reports_budget() {
        let response = app(state_with(vec![]))
            .oneshot(post_generate(r#"{"prompt":"x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("3 iterations"));
    }

    #[tokio::test]
    async fn unavailable_state_reports_reason() {
        let state = GatewayState::unavailable("GOOGLE_ACCESS_TOKEN is not set");
        assert!(!state.is_ready());

        let response = app(state)
            .oneshot(post_generate(r#"{"prompt":"x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to initialize services");
        assert!(body["detail"].as_str().unwrap().contains("GOOGLE_ACCESS_TOKEN"));
    }

    #[test]
    fn missing_credentials_leave_state_unavailable() {
        let state = GatewayState::from_config(&AppConfig::default(), Arc::new(EventBus::default()));
        assert!(!state.is_ready());
    }

    #[test]
    fn template_deck_triggers_concurrency_warning() {
        let mut config = AppConfig::default();
        assert!(shared_template_warning(&config).is_none());

        config.google.template_presentation_id = Some("tmpl-1".into());
        let warning = shared_template_warning(&config).unwrap();
        assert!(warning.contains("tmpl-1"));
        assert!(warning.contains("concurrent"));
    }

    #[tokio::test]
    async fn cors_preflight_allows_frontend_origin() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/generate-presentation")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(state_with(vec![])).oneshot(req).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );
    }
}
