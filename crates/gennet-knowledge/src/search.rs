//! Lexical relevance scoring.
//!
//! A record whose lower-cased text contains the whole query as a substring
//! scores [`PHRASE_SCORE`] plus the per-word points, so any phrase hit
//! outranks every partial hit. Otherwise each distinct query word found in the record scores [`WORD_SCORE`]. Record
//! keywords named by the query add up to one extra point.

use std::collections::HashSet;

use serde::Serialize;

use crate::record::KnowledgeRecord;

pub const PHRASE_SCORE: f32 = 10.0;
pub const WORD_SCORE: f32 = 2.0;
const MAX_KEYWORD_BONUS: f32 = 1.0;

/// Coarse relevance bucket shown to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl Relevance {
    pub fn from_score(score: f32) -> Self {
        if score >= 6.0 {
            Self::High
        } else if score >= 3.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// How a result was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Phrase,
    Keywords,
    Semantic,
}

/// A scored knowledge hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: KnowledgeRecord,
    pub score: f32,
    pub relevance: Relevance,
    pub method: MatchMethod,
}

impl SearchResult {
    pub fn new(record: KnowledgeRecord, score: f32, method: MatchMethod) -> Self {
        Self {
            record,
            score,
            relevance: Relevance::from_score(score),
            method,
        }
    }
}

/// Split on anything that isn't alphanumeric, lower-cased.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Lower-case and collapse whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// A normalized query: trimmed lower-case text plus its distinct words.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub words: Vec<String>,
}

impl Query {
    /// `None` for blank queries or queries without any word characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = normalize(raw);
        let mut seen = HashSet::new();
        let words: Vec<String> = tokenize(&text)
            .into_iter()
            .filter(|w| seen.insert(w.clone()))
            .collect();
        if words.is_empty() {
            return None;
        }
        Some(Self { text, words })
    }
}

/// Precomputed per-record match data.
#[derive(Debug, Clone)]
pub(crate) struct MatchIndex {
    searchable: String,
    tokens: HashSet<String>,
    keywords: Vec<String>,
}

impl MatchIndex {
    pub(crate) fn build(record: &KnowledgeRecord) -> Self {
        let searchable = normalize(&record.searchable_text());
        let tokens = tokenize(&searchable).into_iter().collect();
        let keywords = record
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            searchable,
            tokens,
            keywords,
        }
    }

    /// Score this record against `query`, or `None` when nothing matched.
    pub(crate) fn score(&self, query: &Query) -> Option<(f32, MatchMethod)> {
        let bonus = self.keyword_bonus(query);
        if self.searchable.contains(&query.text) {
            let score = PHRASE_SCORE + WORD_SCORE * query.words.len() as f32 + bonus;
            return Some((score, MatchMethod::Phrase));
        }

        let matched = query.words.iter().filter(|w| self.tokens.contains(*w)).count();
        let score = WORD_SCORE * matched as f32 + bonus;
        if score > 0.0 {
            Some((score, MatchMethod::Keywords))
        } else {
            None
        }
    }

    fn keyword_bonus(&self, query: &Query) -> f32 {
        let hits = self
            .keywords
            .iter()
            .filter(|kw| {
                if kw.contains(|c: char| !c.is_alphanumeric()) {
                    query.text.contains(kw.as_str())
                } else {
                    query.words.iter().any(|w| w == *kw)
                }
            })
            .count();
        (hits as f32 / 10.0).min(MAX_KEYWORD_BONUS)
    }
}
