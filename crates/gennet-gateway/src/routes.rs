//! API route handlers for the gateway.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::assistant::AskRequest;
use crate::error::ApiError;
use crate::server::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const MAX_SEARCH_RESULTS: usize = 50;

type ApiResult = Result<Json<Value>, ApiError>;

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Unwrap a JSON body or turn the rejection into a 400.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text())))
}

/// First non-blank string among `keys`.
fn str_field<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Service description.
pub async fn home(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": "OpenGenNet AI API",
        "version": VERSION,
        "description": "Knowledge-enhanced chat with multi-provider fallback",
        "semantic_search": state.assistant.retriever().semantic_available(),
        "endpoints": {
            "GET /": "Service information",
            "GET /health": "Health check",
            "GET /status": "System status",
            "GET /models": "Available models",
            "POST /ask": "Chat endpoint",
            "POST /chat": "Alias of /ask",
            "POST /search": "Knowledge search",
        },
        "integration": {
            "endpoint": "/ask",
            "method": "POST",
            "request_body": {"message": "userMessage"},
            "response_path": "response",
        },
    }))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let dispatcher = state.assistant.dispatcher();
    let providers: serde_json::Map<String, Value> = dispatcher
        .providers()
        .iter()
        .map(|p| (p.name().to_string(), Value::Bool(p.is_configured())))
        .collect();
    let store = state.assistant.retriever().store();

    Json(json!({
        "status": "healthy",
        "service": "gennet-gateway",
        "version": VERSION,
        "timestamp": timestamp(),
        "providers": providers,
        "providers_available": dispatcher.configured_count(),
        "knowledge_base": {
            "total_records": store.len(),
            "categories": store.categories(),
        },
    }))
}

/// Detailed runtime status.
pub async fn status(State(state): State<Arc<AppState>>) -> ApiResult {
    let assistant = &state.assistant;
    let dispatcher = assistant.dispatcher();
    let retriever = assistant.retriever();
    let sessions = assistant.sessions();
    let knowledge = serde_json::to_value(retriever.store().stats()).map_err(ApiError::internal)?;

    Ok(Json(json!({
        "status": if dispatcher.configured_count() > 0 { "operational" } else { "degraded" },
        "version": VERSION,
        "timestamp": timestamp(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "providers": dispatcher.infos(),
        "routing": {
            "default_provider": state.config.providers.default_provider,
            "smart_routing": dispatcher.smart_routing(),
        },
        "knowledge_base": knowledge,
        "semantic_search": retriever.semantic_available(),
        "sessions": {
            "enabled": sessions.is_enabled(),
            "active": sessions.active_count(),
            "max_sessions": sessions.max_sessions(),
            "max_age_secs": sessions.max_age_secs(),
        },
    })))
}

/// OpenAI-style model list of the credentialed providers.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Value> {
    let created = chrono::Utc::now().timestamp();
    let data: Vec<Value> = state
        .assistant
        .dispatcher()
        .infos()
        .into_iter()
        .filter(|info| info.configured)
        .map(|info| {
            json!({
                "id": info.key,
                "object": "model",
                "created": created,
                "owned_by": "opengennet",
                "name": info.name,
                "model": info.model,
                "specialty": info.specialty,
            })
        })
        .collect();

    Json(json!({ "object": "list", "data": data }))
}

/// Chat endpoint, also mounted at `/chat`.
///
/// Provider outages are reported in the body (`success: false`), not as an HTTP error.
pub async fn ask(State(state): State<Arc<AppState>>, body: Result<Json<Value>, JsonRejection>) -> ApiResult {
    let body = json_body(body)?;
    let message = str_field(&body, &["message", "query"])
        .ok_or_else(|| ApiError::bad_request("Missing 'message' in request"))?;

    let mut request = AskRequest::new(message);
    request.use_expert_context = body
        .get("use_expert_context")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    request.provider = str_field(&body, &["provider"]).map(str::to_string);
    request.session_id = str_field(&body, &["session_id"]).map(str::to_string);
    request.max_tokens = body
        .get("max_tokens")
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX));

    let reply = state.assistant.ask(request).await;
    let expert_context_used = reply.expert_context_used();
    let sources: Vec<Value> = reply
        .sources
        .iter()
        .map(|hit| {
            json!({
                "id": hit.record.id,
                "title": hit.record.title,
                "category": hit.record.category,
                "relevance": hit.relevance,
            })
        })
        .collect();
    let answer = reply.outcome.answer();

    Ok(Json(json!({
        "response": reply.outcome.text(),
        "provider": reply.outcome.provider_key(),
        "provider_name": answer.map(|a| a.provider_name.as_str()),
        "model": answer.map(|a| a.model.as_str()),
        "usage": answer.and_then(|a| a.usage.as_ref()),
        "success": reply.outcome.is_answered(),
        "expert_context_used": expert_context_used,
        "expert_sources": sources,
        "session_id": reply.session_id,
        "message_count": state.assistant.sessions().message_count(&reply.session_id),
        "response_time_ms": reply.elapsed_ms,
        "timestamp": timestamp(),
        "version": VERSION,
    })))
}

/// Knowledge search.
pub async fn search(State(state): State<Arc<AppState>>, body: Result<Json<Value>, JsonRejection>) -> ApiResult {
    let body = json_body(body)?;
    let query = str_field(&body, &["query"]).ok_or_else(|| ApiError::bad_request("Missing 'query' in request"))?;
    let category = str_field(&body, &["category"]);
    let top_k = body
        .get("top_k")
        .and_then(Value::as_u64)
        .map_or(state.config.knowledge.top_k, |n| usize::try_from(n).unwrap_or(usize::MAX))
        .clamp(1, MAX_SEARCH_RESULTS);

    let retriever = state.assistant.retriever();
    let results = retriever.search(query, top_k, category).await;
    let total = results.len();
    let results = serde_json::to_value(results).map_err(ApiError::internal)?;

    Ok(Json(json!({
        "query": query,
        "category": category,
        "results": results,
        "total_results": total,
        "semantic_search": retriever.semantic_available(),
        "timestamp": timestamp(),
        "version": VERSION,
    })))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": { "message": "Endpoint not found", "type": "not_found" } })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::Assistant;
    use crate::server::build_router;
    use crate::sessions::SessionStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use gennet_core::config::GenNetConfig;
    use gennet_core::error::{GenNetError, Result};
    use gennet_core::traits::{GenerateParams, Provider};
    use gennet_core::types::{Message, ProviderInfo, ProviderResponse};
    use gennet_knowledge::{KnowledgeStore, Retriever};
    use gennet_providers::Dispatcher;
    use tower::ServiceExt;

    struct MockProvider {
        key: &'static str,
        configured: bool,
        fails: bool,
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            self.key
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                key: self.key.into(),
                name: format!("Mock {}", self.key),
                model: "mock-1".into(),
                endpoint: "http://mock".into(),
                specialty: "tests".into(),
                configured: self.configured,
            }
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn chat(&self, _messages: &[Message], _params: &GenerateParams) -> Result<ProviderResponse> {
            if self.fails {
                return Err(GenNetError::provider("mock outage"));
            }
            Ok(ProviderResponse {
                content: "Hi there!".into(),
                model: "mock-1".into(),
                finish_reason: Some("stop".into()),
                usage: None,
            })
        }
    }

    /// A provider with a bug: it panics instead of returning an error.
    struct PanickingProvider;

    #[async_trait]
    impl Provider for PanickingProvider {
        fn name(&self) -> &str {
            "groq_fast"
        }

        fn info(&self) -> ProviderInfo {
            MockProvider {
                key: "groq_fast",
                configured: true,
                fails: false,
            }
            .info()
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn chat(&self, _messages: &[Message], _params: &GenerateParams) -> Result<ProviderResponse> {
            panic!("internal bug")
        }
    }

    fn test_state(providers: Vec<MockProvider>) -> AppState {
        let providers: Vec<Box<dyn Provider>> = providers
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn Provider>)
            .collect();
        state_with(providers)
    }

    fn state_with(providers: Vec<Box<dyn Provider>>) -> AppState {
        let config = GenNetConfig::default();
        let retriever = Arc::new(Retriever::lexical(Arc::new(KnowledgeStore::builtin())));
        let dispatcher = Arc::new(Dispatcher::new(providers));
        let sessions = Arc::new(SessionStore::new(&config.sessions));
        let assistant = Assistant::new(retriever, dispatcher, sessions, &config.providers, &config.knowledge);
        AppState::new(config, Arc::new(assistant))
    }

    fn working() -> Vec<MockProvider> {
        vec![MockProvider {
            key: "groq_fast",
            configured: true,
            fails: false,
        }]
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_ask_missing_message_is_400() {
        let (status, json) = send(test_state(working()), post("/ask", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing 'message' in request");
    }

    #[tokio::test]
    async fn test_ask_blank_message_is_400() {
        let (status, _) = send(test_state(working()), post("/ask", r#"{"message":"   "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_invalid_json_is_400() {
        let (status, json) = send(test_state(working()), post("/ask", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_ask_hello() {
        let (status, json) = send(test_state(working()), post("/ask", r#"{"message":"hello"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Hi there!");
        assert_eq!(json["success"], true);
        assert_eq!(json["provider"], "groq_fast");
        assert_eq!(json["provider_name"], "Mock groq_fast");
        assert_eq!(json["expert_context_used"], false);
        assert_eq!(json["message_count"], 2);
        assert!(json["session_id"].as_str().unwrap().starts_with("session_"));
    }

    #[tokio::test]
    async fn test_chat_alias_accepts_query_field() {
        let body = r#"{"query":"explain kubernetes orchestration","session_id":"s-1"}"#;
        let (status, json) = send(test_state(working()), post("/chat", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["session_id"], "s-1");
        assert_eq!(json["expert_context_used"], true);
        assert!(!json["expert_sources"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ask_failover_to_second_provider() {
        let providers = vec![
            MockProvider {
                key: "groq_fast",
                configured: true,
                fails: true,
            },
            MockProvider {
                key: "qwen",
                configured: true,
                fails: false,
            },
        ];
        let (status, json) = send(test_state(providers), post("/ask", r#"{"message":"hello"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["provider"], "qwen");
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn test_ask_without_credentials_reports_unavailable() {
        let providers = vec![MockProvider {
            key: "groq_fast",
            configured: false,
            fails: false,
        }];
        let (status, json) = send(test_state(providers), post("/ask", r#"{"message":"hello"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert_eq!(json["provider"], "none");
        assert_eq!(
            json["response"],
            "No AI providers available. Please check API key configuration."
        );
    }

    #[tokio::test]
    async fn test_handler_panic_is_500() {
        let state = state_with(vec![Box::new(PanickingProvider)]);
        let (status, json) = send(state, post("/ask", r#"{"message":"hello"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Request processing error: internal bug");
    }

    #[tokio::test]
    async fn test_search() {
        let body = r#"{"query":"Zero-trust security architecture","top_k":2}"#;
        let (status, json) = send(test_state(working()), post("/search", body)).await;
        assert_eq!(status, StatusCode::OK);
        let results = json["results"].as_array().unwrap();
        assert!(results.len() <= 2);
        assert_eq!(results[0]["category"], "cybersecurity");
        assert!(results[0]["title"].as_str().unwrap().starts_with("Zero-trust"));
        assert_eq!(json["total_results"], results.len());
    }

    #[tokio::test]
    async fn test_search_missing_query_is_400() {
        let (status, json) = send(test_state(working()), post("/search", r#"{"top_k":3}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing 'query' in request");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = send(test_state(working()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["providers"]["groq_fast"], true);
        assert_eq!(json["knowledge_base"]["total_records"], 21);
    }

    #[tokio::test]
    async fn test_status_reports_sessions_and_knowledge() {
        let (status, json) = send(test_state(working()), get("/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "operational");
        assert_eq!(json["knowledge_base"]["total_records"], 21);
        assert_eq!(json["sessions"]["max_sessions"], 1000);
        assert_eq!(json["providers"][0]["key"], "groq_fast");
    }

    #[tokio::test]
    async fn test_models_lists_configured_only() {
        let providers = vec![
            MockProvider {
                key: "groq_fast",
                configured: true,
                fails: false,
            },
            MockProvider {
                key: "deepseek",
                configured: false,
                fails: false,
            },
        ];
        let (status, json) = send(test_state(providers), get("/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["object"], "list");
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], "groq_fast");
        assert_eq!(data[0]["owned_by"], "opengennet");
    }

    #[tokio::test]
    async fn test_options_always_200() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ask")
            .body(Body::empty())
            .unwrap();
        let response = build_router(test_state(working())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (status, json) = send(test_state(working()), get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["type"], "not_found");
    }

    #[tokio::test]
    async fn test_home_lists_endpoints() {
        let (status, json) = send(test_state(working()), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["endpoints"]["POST /ask"].is_string());
    }
}
