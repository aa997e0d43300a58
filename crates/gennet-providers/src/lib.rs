//! # GenNet Providers
//!
//! Chat providers for GenNet and the fallback dispatcher that drives them.
//!
//! Every backend speaks the OpenAI chat-completions API, so a single
//! `OpenAiCompatibleProvider` covers the whole registry. Credentials come
//! from environment variables; a provider without one is skipped.

pub mod dispatcher;
pub mod openai_compatible;
pub mod provider_registry;
pub mod selection;

use std::time::Duration;

use gennet_core::config::ProvidersConfig;
use gennet_core::traits::Provider;

pub use dispatcher::{Answer, DispatchOutcome, Dispatcher, Unavailable};

/// Create every registry provider, resolving API keys from the environment.
pub fn create_providers(config: &ProvidersConfig) -> Vec<Box<dyn Provider>> {
    create_providers_with(config, |var| std::env::var(var).ok())
}

/// Create every registry provider, resolving API keys through `lookup`.
pub fn create_providers_with<F>(config: &ProvidersConfig, lookup: F) -> Vec<Box<dyn Provider>>
where
    F: Fn(&str) -> Option<String>,
{
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    provider_registry::all_providers()
        .iter()
        .map(|def| {
            let provider = openai_compatible::OpenAiCompatibleProvider::from_def(def, lookup(def.env_key), timeout);
            tracing::debug!(
                "provider {} ({}): {}",
                def.key,
                def.model,
                if provider.is_configured() { "configured" } else { "no API key" }
            );
            Box::new(provider) as Box<dyn Provider>
        })
        .collect()
}

/// Build the dispatcher described by `config`.
pub fn create_dispatcher(config: &ProvidersConfig) -> Dispatcher {
    Dispatcher::new(create_providers(config))
        .with_default_provider(config.default_provider.clone())
        .with_smart_routing(config.smart_routing)
}

/// List all known provider keys.
pub fn available_providers() -> Vec<&'static str> {
    provider_registry::all_provider_keys()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_providers_with_lookup() {
        let config = ProvidersConfig::default();
        let providers = create_providers_with(&config, |var| (var == "QWEN_KEY").then(|| "sk-or".to_string()));
        assert_eq!(providers.len(), 4);
        let configured: Vec<_> = providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
            .collect();
        assert_eq!(configured, vec!["qwen"]);
    }

    #[test]
    fn test_empty_key_disables_provider() {
        let config = ProvidersConfig::default();
        let providers = create_providers_with(&config, |_| Some(String::new()));
        assert!(providers.iter().all(|p| !p.is_configured()));
    }

    #[test]
    fn test_available_providers() {
        assert_eq!(available_providers().len(), 4);
    }
}
