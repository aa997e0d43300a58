//! Unified OpenAI-compatible provider.
//!
//! One struct serves every registry entry; backends differ only by base URL,
//! model, API key and extra headers.

use std::time::Duration;

use async_trait::async_trait;
use gennet_core::error::{GenNetError, Result};
use gennet_core::traits::provider::{GenerateParams, Provider};
use gennet_core::types::{Message, ProviderInfo, ProviderResponse, Usage};
use serde_json::{Value, json};

use crate::provider_registry::ProviderDef;

/// A chat-completions client for one OpenAI-compatible backend.
pub struct OpenAiCompatibleProvider {
    key: String,
    name: String,
    model: String,
    base_url: String,
    chat_path: String,
    specialty: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Build from a registry entry. A missing or empty key leaves the provider unconfigured.
    pub fn from_def(def: &ProviderDef, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            key: def.key.to_string(),
            name: def.name.to_string(),
            model: def.model.to_string(),
            base_url: def.base_url.to_string(),
            chat_path: def.chat_path.to_string(),
            specialty: def.specialty.to_string(),
            api_key: api_key.map(|k| k.trim().to_string()).unwrap_or_default(),
            extra_headers: def
                .extra_headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            client,
        }
    }

    /// Point the client at a different server (local proxies, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.chat_path)
    }

    fn apply_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header("Authorization", format!("Bearer {}", self.api_key));
        self.extra_headers
            .iter()
            .fold(req, |req, (k, v)| req.header(k.as_str(), v.as_str()))
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.key
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            key: self.key.clone(),
            name: self.name.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint(),
            specialty: self.specialty.clone(),
            configured: self.is_configured(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn chat(&self, messages: &[Message], params: &GenerateParams) -> Result<ProviderResponse> {
        if !self.is_configured() {
            return Err(GenNetError::ApiKeyMissing(self.key.clone()));
        }

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        let url = self.endpoint();
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let req = self.apply_headers(req);

        let resp = req.send().await.map_err(|e| {
            GenNetError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenNetError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| GenNetError::Http(format!("{} returned invalid JSON: {}", self.name, e)))?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| GenNetError::provider(format!("{}: no choices in response", self.name)))?;

        let content = choice["message"]["content"]
            .as_str()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GenNetError::provider(format!("{}: empty message content", self.name)))?
            .to_string();

        let usage = json["usage"].as_object().map(|u| Usage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ProviderResponse {
            content,
            model: json["model"].as_str().unwrap_or(&self.model).to_string(),
            finish_reason: choice["finish_reason"].as_str().map(String::from),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider_registry::get_provider_def;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(key: &str, api_key: Option<&str>, server: &MockServer) -> OpenAiCompatibleProvider {
        let def = get_provider_def(key).unwrap();
        OpenAiCompatibleProvider::from_def(def, api_key.map(String::from), Duration::from_secs(5))
            .with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_chat_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gsk-test"))
            .and(body_partial_json(json!({"model": "llama-3.1-8b-instant", "max_tokens": 256})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama-3.1-8b-instant",
                "choices": [{"message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
            })))
            .mount(&server)
            .await;

        let p = provider("groq_fast", Some("gsk-test"), &server);
        let params = GenerateParams { max_tokens: 256, temperature: 0.7 };
        let resp = p.chat(&[Message::user("hi")], &params).await.unwrap();
        assert_eq!(resp.content, "Hello!");
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.usage.unwrap().total_tokens, 7);
    }

    #[tokio::test]
    async fn test_openrouter_headers_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("HTTP-Referer", "https://opengennet.ai"))
            .and(header("X-Title", "OpenGenNet AI API"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "reasoned"}}]
            })))
            .mount(&server)
            .await;

        let p = provider("deepseek", Some("or-key"), &server);
        let resp = p.chat(&[Message::user("why?")], &GenerateParams::default()).await.unwrap();
        assert_eq!(resp.content, "reasoned");
        assert_eq!(resp.model, "deepseek/deepseek-r1");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let p = provider("qwen", Some("k"), &server);
        let err = p.chat(&[Message::user("hi")], &GenerateParams::default()).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;
        let p = provider("groq_fast", Some("k"), &server);
        assert!(p.chat(&[Message::user("hi")], &GenerateParams::default()).await.is_err());

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": null}}]
            })))
            .mount(&server)
            .await;
        let p = provider("groq_fast", Some("k"), &server);
        assert!(p.chat(&[Message::user("hi")], &GenerateParams::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let server = MockServer::start().await;
        let p = provider("groq_fast", Some("  "), &server);
        assert!(!p.is_configured());
        assert!(!p.info().configured);
        let err = p.chat(&[Message::user("hi")], &GenerateParams::default()).await.unwrap_err();
        assert!(matches!(err, GenNetError::ApiKeyMissing(_)));
    }
}
