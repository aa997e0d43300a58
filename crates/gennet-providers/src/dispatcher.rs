//! Provider dispatcher: sequential fallback across the configured providers.
//!
//! Candidate order: the preferred provider (when known and credentialed),
//! then every other credentialed provider in declared order. Each candidate
//! gets exactly one request; the first usable answer wins.

use gennet_core::traits::provider::{GenerateParams, Provider};
use gennet_core::types::{Message, ProviderInfo, Usage};

use crate::provider_registry::canonical_key;
use crate::selection::route_by_content;

const NONE_CONFIGURED_TEXT: &str = "No AI providers available. Please check API key configuration.";
const EXHAUSTED_TEXT: &str = "All AI providers are currently unavailable. Please try again later.";

/// A reply from the provider that answered.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Provider key, e.g. `groq_fast`.
    pub provider: String,
    pub provider_name: String,
    pub model: String,
    pub usage: Option<Usage>,
    /// Providers that failed before this one answered.
    pub failed: Vec<String>,
}

/// Why no answer was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// No provider has a credential.
    NoneConfigured,
    /// Every credentialed provider was tried and failed.
    Exhausted { attempted: Vec<String> },
}

impl Unavailable {
    /// Fixed user-facing text for this failure.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::NoneConfigured => NONE_CONFIGURED_TEXT,
            Self::Exhausted { .. } => EXHAUSTED_TEXT,
        }
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Answered(Answer),
    Unavailable(Unavailable),
}

impl DispatchOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    /// Reply text, or the sentinel when unavailable.
    pub fn text(&self) -> &str {
        match self {
            Self::Answered(answer) => &answer.text,
            Self::Unavailable(reason) => reason.sentinel(),
        }
    }

    /// Key of the answering provider, `"none"` when unavailable.
    pub fn provider_key(&self) -> &str {
        match self {
            Self::Answered(answer) => &answer.provider,
            Self::Unavailable(_) => "none",
        }
    }

    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Answered(answer) => Some(answer),
            Self::Unavailable(_) => None,
        }
    }
}

/// Ordered provider list plus selection policy. Immutable after construction.
pub struct Dispatcher {
    providers: Vec<Box<dyn Provider>>,
    default_provider: Option<String>,
    smart_routing: bool,
}

impl Dispatcher {
    /// Providers are tried in the given order after the preferred one.
    pub fn new(providers: Vec<Box<dyn Provider>>) -> Self {
        Self {
            providers,
            default_provider: None,
            smart_routing: false,
        }
    }

    pub fn with_default_provider(mut self, key: Option<String>) -> Self {
        self.default_provider = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_smart_routing(mut self, enabled: bool) -> Self {
        self.smart_routing = enabled;
        self
    }

    pub fn providers(&self) -> &[Box<dyn Provider>] {
        &self.providers
    }

    pub fn infos(&self) -> Vec<ProviderInfo> {
        self.providers.iter().map(|p| p.info()).collect()
    }

    pub fn configured_count(&self) -> usize {
        self.providers.iter().filter(|p| p.is_configured()).count()
    }

    pub fn smart_routing(&self) -> bool {
        self.smart_routing
    }

    /// The preferred provider for a request: the caller's choice, else a
    /// content-based pick when smart routing is on, else the configured default.
    pub fn preference(&self, requested: Option<&str>, message: &str) -> Option<String> {
        let requested = requested.map(str::trim).filter(|r| !r.is_empty());
        if let Some(requested) = requested {
            return Some(requested.to_string());
        }
        if self.smart_routing {
            return Some(route_by_content(message).to_string());
        }
        self.default_provider.clone()
    }

    /// Credentialed providers in the order they will be tried.
    pub fn candidates(&self, preferred: Option<&str>) -> Vec<&dyn Provider> {
        let preferred = preferred.map(canonical_key);
        let first = preferred.and_then(|key| {
            self.providers
                .iter()
                .position(|p| p.name() == key && p.is_configured())
        });

        let mut order: Vec<&dyn Provider> = Vec::with_capacity(self.providers.len());
        if let Some(idx) = first {
            order.push(self.providers[idx].as_ref());
        }
        order.extend(
            self.providers
                .iter()
                .enumerate()
                .filter(|(idx, p)| Some(*idx) != first && p.is_configured())
                .map(|(_, p)| p.as_ref()),
        );
        order
    }

    /// Send `messages` to each candidate in turn until one answers.
    pub async fn dispatch(
        &self,
        messages: &[Message],
        preferred: Option<&str>,
        params: &GenerateParams,
    ) -> DispatchOutcome {
        let candidates = self.candidates(preferred);
        if candidates.is_empty() {
            tracing::warn!("⚠️ No AI providers configured");
            return DispatchOutcome::Unavailable(Unavailable::NoneConfigured);
        }

        let mut failed = Vec::new();
        for provider in candidates {
            match provider.chat(messages, params).await {
                Ok(response) => {
                    if let Some(first) = failed.first() {
                        tracing::info!("🔄 Failover: {} → {} (success)", first, provider.name());
                    }
                    let info = provider.info();
                    return DispatchOutcome::Answered(Answer {
                        text: response.content,
                        provider: info.key,
                        provider_name: info.name,
                        model: response.model,
                        usage: response.usage,
                        failed,
                    });
                }
                Err(e) => {
                    tracing::warn!("⚠️ Provider {} failed: {}", provider.name(), e);
                    failed.push(provider.name().to_string());
                }
            }
        }

        tracing::warn!("⚠️ All AI providers failed: {}", failed.join(", "));
        DispatchOutcome::Unavailable(Unavailable::Exhausted { attempted: failed })
    }

    /// Dispatch a single user prompt with default parameters.
    pub async fn dispatch_prompt(&self, prompt: &str, preferred: Option<&str>) -> DispatchOutcome {
        self.dispatch(&[Message::user(prompt)], preferred, &GenerateParams::default())
            .await
    }
}
