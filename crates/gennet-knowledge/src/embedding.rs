//! Optional semantic layer over an OpenAI-compatible `/embeddings` endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gennet_core::error::{GenNetError, Result};
use serde::{Deserialize, Serialize};

use crate::search::{MatchMethod, SearchResult};
use crate::store::KnowledgeStore;

/// Semantic similarity is scaled by this to sit on the lexical score scale.
pub const SEMANTIC_SCALE: f32 = 10.0;

/// Text embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingsData>,
}

#[derive(Deserialize)]
struct EmbeddingsData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embedder for any server speaking the OpenAI embeddings API (Ollama, llama.cpp, vLLM, ...).
pub struct OpenAiCompatibleEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleEmbedder {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let mut req = self.client.post(&url).json(&EmbeddingsRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GenNetError::Embedding(format!("request to {url} failed: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenNetError::Embedding(format!("HTTP {status}: {text}")));
        }

        let mut body: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| GenNetError::Embedding(format!("invalid response: {e}")))?;
        if body.data.len() != texts.len() {
            return Err(GenNetError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }
        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom > 0.0 { dot / denom } else { 0.0 }
}

/// Record vectors computed once at start-up.
pub struct SemanticIndex {
    embedder: Arc<dyn Embedder>,
    vectors: Vec<Vec<f32>>,
    min_similarity: f32,
}

impl SemanticIndex {
    /// Embed every record in `store`.
    pub async fn build(embedder: Arc<dyn Embedder>, store: &KnowledgeStore, min_similarity: f32) -> Result<Self> {
        let texts: Vec<String> = store.records().iter().map(|r| r.full_text()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(GenNetError::Embedding("embedding count mismatch".into()));
        }
        tracing::info!("🧠 Semantic index ready: {} vectors via {}", vectors.len(), embedder.name());
        Ok(Self {
            embedder,
            vectors,
            min_similarity,
        })
    }

    /// Records whose similarity to `query` clears the threshold, best first.
    pub async fn search(
        &self,
        store: &KnowledgeStore,
        query: &str,
        top_k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GenNetError::Embedding("empty query embedding".into()))?;

        let mut results: Vec<SearchResult> = store
            .records()
            .iter()
            .zip(&self.vectors)
            .filter(|(record, _)| category.is_none_or(|c| record.category.eq_ignore_ascii_case(c)))
            .filter_map(|(record, vector)| {
                let similarity = cosine_similarity(&query_vec, vector);
                (similarity >= self.min_similarity).then(|| {
                    SearchResult::new(record.clone(), similarity * SEMANTIC_SCALE, MatchMethod::Semantic)
                })
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
