//! Knowledge record type.

use serde::{Deserialize, Serialize};

/// A single expert knowledge snippet. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub id: String,
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub technology: String,
    #[serde(default = "default_quality")]
    pub quality: f32,
}

pub(crate) fn default_quality() -> f32 {
    85.0
}

impl KnowledgeRecord {
    pub fn new(id: impl Into<String>, category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            title: title.into(),
            body: String::new(),
            keywords: Vec::new(),
            technology: String::new(),
            quality: default_quality(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = technology.into();
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Lower-cased text the lexical matcher runs against.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.title,
            self.body,
            self.keywords.join(" "),
            self.technology
        )
        .to_lowercase()
    }

    /// Text fed to the embedding model.
    pub fn full_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}. {}", self.title, self.body)
        }
    }
}
