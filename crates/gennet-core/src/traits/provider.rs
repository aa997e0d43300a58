//! LLM provider trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Message, ProviderInfo, ProviderResponse};

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// A chat-completions backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider key used for selection and in responses.
    fn name(&self) -> &str;

    /// Description for status and model listings.
    fn info(&self) -> ProviderInfo;

    /// True when a credential is available; unconfigured providers are skipped.
    fn is_configured(&self) -> bool;

    /// Send one chat-completions request. Any error means "try the next provider".
    async fn chat(&self, messages: &[Message], params: &GenerateParams) -> Result<ProviderResponse>;
}
