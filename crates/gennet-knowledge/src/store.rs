//! In-memory knowledge store.

use std::collections::BTreeMap;
use std::path::Path;

use gennet_core::config::KnowledgeConfig;
use gennet_core::error::Result;
use serde::Serialize;

use crate::builtin::builtin_records;
use crate::loader;
use crate::record::KnowledgeRecord;
use crate::search::{MatchIndex, Query, SearchResult};

/// Immutable list of knowledge records with precomputed match data.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    records: Vec<KnowledgeRecord>,
    index: Vec<MatchIndex>,
    min_score: f32,
}

/// Summary of what the store holds.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeStats {
    pub total_records: usize,
    pub categories: BTreeMap<String, usize>,
    pub quality: QualityStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityStats {
    pub average: f32,
    pub min: f32,
    pub max: f32,
}

impl KnowledgeStore {
    pub fn new(records: Vec<KnowledgeRecord>) -> Self {
        let index = records.iter().map(MatchIndex::build).collect();
        Self {
            records,
            index,
            min_score: 1.0,
        }
    }

    /// Store over the built-in table.
    pub fn builtin() -> Self {
        Self::new(builtin_records())
    }

    /// Store over every JSON file in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self::new(loader::load_dir(dir)?))
    }

    /// Build from config: the data directory when set and non-empty, else the built-in table.
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        let dir = config
            .data_dir
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let store = match dir {
            Some(dir) => match Self::from_dir(Path::new(dir)) {
                Ok(store) if !store.is_empty() => store,
                Ok(_) => {
                    tracing::warn!("⚠️ No knowledge records in {dir}, using built-in table");
                    Self::builtin()
                }
                Err(e) => {
                    tracing::warn!("⚠️ {e}, using built-in table");
                    Self::builtin()
                }
            },
            None => Self::builtin(),
        };
        store.with_min_score(config.min_score)
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    /// Top `top_k` records for `query`, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        self.search_in(query, top_k, None)
    }

    /// Like [`search`](Self::search), restricted to one category (case-insensitive).
    pub fn search_in(&self, query: &str, top_k: usize, category: Option<&str>) -> Vec<SearchResult> {
        let Some(query) = Query::parse(query) else {
            return Vec::new();
        };

        let mut results: Vec<SearchResult> = self
            .records
            .iter()
            .zip(&self.index)
            .filter(|(record, _)| category.is_none_or(|c| record.category.eq_ignore_ascii_case(c)))
            .filter_map(|(record, idx)| {
                idx.score(&query)
                    .filter(|(score, _)| *score >= self.min_score)
                    .map(|(score, method)| SearchResult::new(record.clone(), score, method))
            })
            .collect();

        // sort_by is stable: equal scores keep table order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        results
    }

    pub fn records(&self) -> &[KnowledgeRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Category names in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for record in &self.records {
            if !seen.contains(&record.category) {
                seen.push(record.category.clone());
            }
        }
        seen
    }

    pub fn stats(&self) -> KnowledgeStats {
        let mut categories = BTreeMap::new();
        for record in &self.records {
            *categories.entry(record.category.clone()).or_insert(0) += 1;
        }

        let quality = if self.records.is_empty() {
            QualityStats { average: 0.0, min: 0.0, max: 0.0 }
        } else {
            let sum: f32 = self.records.iter().map(|r| r.quality).sum();
            QualityStats {
                average: sum / self.records.len() as f32,
                min: self.records.iter().map(|r| r.quality).fold(f32::INFINITY, f32::min),
                max: self.records.iter().map(|r| r.quality).fold(f32::NEG_INFINITY, f32::max),
            }
        };

        KnowledgeStats {
            total_records: self.records.len(),
            categories,
            quality,
        }
    }
}
