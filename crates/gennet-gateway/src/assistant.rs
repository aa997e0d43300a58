//! Chat pipeline: knowledge search → prompt enhancement → session history → provider dispatch.

use std::sync::Arc;
use std::time::Instant;

use gennet_core::config::{KnowledgeConfig, ProvidersConfig};
use gennet_core::traits::GenerateParams;
use gennet_core::types::Message;
use gennet_knowledge::{Retriever, SearchResult, enhance_prompt};
use gennet_providers::{DispatchOutcome, Dispatcher};

use crate::sessions::SessionStore;

const MAX_TOKENS_CEILING: u32 = 8192;

/// One inbound chat request.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub message: String,
    pub use_expert_context: bool,
    pub provider: Option<String>,
    pub session_id: Option<String>,
    pub max_tokens: Option<u32>,
}

impl AskRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            use_expert_context: true,
            provider: None,
            session_id: None,
            max_tokens: None,
        }
    }
}

/// Result of one chat turn.
#[derive(Debug, Clone)]
pub struct AskReply {
    pub outcome: DispatchOutcome,
    pub session_id: String,
    /// Snippets spliced into the prompt (empty when none were used).
    pub sources: Vec<SearchResult>,
    pub elapsed_ms: u64,
}

impl AskReply {
    pub fn expert_context_used(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Everything a chat turn needs. Cheap to share behind `Arc`.
pub struct Assistant {
    retriever: Arc<Retriever>,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionStore>,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
    context_snippets: usize,
}

impl Assistant {
    pub fn new(
        retriever: Arc<Retriever>,
        dispatcher: Arc<Dispatcher>,
        sessions: Arc<SessionStore>,
        providers: &ProvidersConfig,
        knowledge: &KnowledgeConfig,
    ) -> Self {
        Self {
            retriever,
            dispatcher,
            sessions,
            system_prompt: providers.system_prompt.clone(),
            max_tokens: providers.max_tokens,
            temperature: providers.temperature,
            context_snippets: knowledge.context_snippets,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one chat turn. Provider failures surface as an unavailable outcome, never an error.
    pub async fn ask(&self, request: AskRequest) -> AskReply {
        let started = Instant::now();
        let message = request.message.trim();

        let sources = if request.use_expert_context && self.context_snippets > 0 {
            self.retriever.search(message, self.context_snippets, None).await
        } else {
            Vec::new()
        };
        let prompt = enhance_prompt(message, &sources, self.context_snippets);
        if !sources.is_empty() {
            tracing::debug!("📚 {} knowledge snippet(s) added to prompt", sources.len());
        }

        let (session_id, history) = self.sessions.begin_turn(request.session_id.as_deref(), message);
        let messages = self.build_messages(history, prompt);

        let preferred = self.dispatcher.preference(request.provider.as_deref(), message);
        let params = GenerateParams {
            max_tokens: request
                .max_tokens
                .unwrap_or(self.max_tokens)
                .clamp(1, MAX_TOKENS_CEILING),
            temperature: self.temperature,
        };

        let outcome = self
            .dispatcher
            .dispatch(&messages, preferred.as_deref(), &params)
            .await;
        if let DispatchOutcome::Answered(answer) = &outcome {
            self.sessions.record_reply(&session_id, &answer.text);
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            "💬 session={} provider={} success={} {}ms",
            session_id,
            outcome.provider_key(),
            outcome.is_answered(),
            elapsed_ms
        );

        AskReply {
            outcome,
            session_id,
            sources,
            elapsed_ms,
        }
    }

    /// System prompt, prior turns, then the (possibly enhanced) current message.
    fn build_messages(&self, mut history: Vec<Message>, prompt: String) -> Vec<Message> {
        if let Some(last) = history.last_mut() {
            last.content = prompt;
        } else {
            history.push(Message::user(prompt));
        }

        let mut messages = Vec::with_capacity(history.len() + 1);
        if !self.system_prompt.trim().is_empty() {
            messages.push(Message::system(self.system_prompt.clone()));
        }
        messages.extend(history);
        messages
    }
}
