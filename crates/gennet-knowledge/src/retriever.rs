//! Lexical + optional semantic retrieval over a [`KnowledgeStore`].

use std::collections::HashSet;
use std::sync::Arc;

use gennet_core::config::EmbeddingConfig;

use crate::embedding::{Embedder, OpenAiCompatibleEmbedder, SemanticIndex};
use crate::search::SearchResult;
use crate::store::KnowledgeStore;

/// Knowledge retriever shared by request handlers.
///
/// Lexical hits come first; semantic hits are appended, deduplicated by
/// record id (first copy wins), then the merged list is re-ranked.
pub struct Retriever {
    store: Arc<KnowledgeStore>,
    semantic: Option<SemanticIndex>,
}

impl Retriever {
    /// Lexical-only retriever.
    pub fn lexical(store: Arc<KnowledgeStore>) -> Self {
        Self { store, semantic: None }
    }

    /// Build from config. An unreachable embedding endpoint leaves the retriever lexical-only.
    pub async fn from_config(store: Arc<KnowledgeStore>, config: &EmbeddingConfig) -> Self {
        if !config.enabled {
            return Self::lexical(store);
        }
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        let embedder = Arc::new(OpenAiCompatibleEmbedder::new(&config.endpoint, &config.model, api_key));
        Self::with_embedder(store, embedder, config.min_similarity).await
    }

    /// Build with a specific embedder, degrading to lexical on failure.
    pub async fn with_embedder(store: Arc<KnowledgeStore>, embedder: Arc<dyn Embedder>, min_similarity: f32) -> Self {
        match SemanticIndex::build(embedder, &store, min_similarity).await {
            Ok(index) => Self {
                store,
                semantic: Some(index),
            },
            Err(e) => {
                tracing::warn!("⚠️ Semantic search unavailable, using keyword matching only: {e}");
                Self::lexical(store)
            }
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn semantic_available(&self) -> bool {
        self.semantic.is_some()
    }

    /// Best `top_k` hits for `query`, optionally limited to one category.
    pub async fn search(&self, query: &str, top_k: usize, category: Option<&str>) -> Vec<SearchResult> {
        if query.trim().is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut candidates = self.store.search_in(query, usize::MAX, category);
        if let Some(semantic) = &self.semantic {
            match semantic.search(&self.store, query, top_k, category).await {
                Ok(hits) => candidates.extend(hits),
                Err(e) => tracing::debug!("semantic search skipped: {e}"),
            }
        }
        merge(candidates, top_k)
    }
}

fn merge(candidates: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut merged: Vec<SearchResult> = candidates
        .into_iter()
        .filter(|r| seen.insert(r.record.id.clone()))
        .collect();
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(top_k);
    merged
}
