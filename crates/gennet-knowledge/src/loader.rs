//! JSON knowledge loader.
//!
//! Reads every `*.json` file under a directory and normalizes the case
//! objects it finds into [`KnowledgeRecord`]s. Accepted layouts:
//!
//! - `{"expert_training_cases": [ ... ]}`
//! - `{"expert_knowledge": {"<category>": [ ... ]}}`
//! - `{"data": [ ... ]}`
//! - a bare array of cases
//! - any object whose keys hold arrays of cases (the key becomes the category)

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use gennet_core::error::{GenNetError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::record::{KnowledgeRecord, default_quality};

const TECH_VOCABULARY: &[&str] = &[
    "firewall", "vpn", "network", "security", "encryption", "aws", "azure",
    "cisco", "routing", "switching", "tcp", "ip", "ssl", "tls", "dns",
    "dhcp", "vlan", "bgp", "ospf", "ipsec", "vulnerability", "penetration",
    "malware", "phishing", "ddos", "intrusion", "authentication",
    "authorization", "compliance", "incident", "forensics", "monitoring",
];

static TECH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d+\.\d+\.\d+\.\d+\b",
        r"\b[A-Z]{2,10}\b",
        r"\b\w*[Pp]ort\s*\d+\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Load all records from JSON files under `dir`, in path order.
///
/// Unreadable or malformed files are skipped with a warning.
pub fn load_dir(dir: &Path) -> Result<Vec<KnowledgeRecord>> {
    if !dir.is_dir() {
        return Err(GenNetError::Knowledge(format!(
            "knowledge directory not found: {}",
            dir.display()
        )));
    }

    let mut records = Vec::new();
    let files = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"));

    for entry in files {
        let path = entry.path();
        let parsed = std::fs::read_to_string(path)
            .map_err(GenNetError::from)
            .and_then(|content| serde_json::from_str::<Value>(&content).map_err(GenNetError::from));
        match parsed {
            Ok(value) => {
                let found = parse_document(&value);
                tracing::debug!("📄 {} → {} cases", path.display(), found.len());
                records.extend(found);
            }
            Err(e) => tracing::warn!("⚠️ Could not load {}: {e}", path.display()),
        }
    }

    tracing::info!("📚 Loaded {} knowledge records from {}", records.len(), dir.display());
    Ok(records)
}

/// Extract records from one parsed JSON document.
pub fn parse_document(value: &Value) -> Vec<KnowledgeRecord> {
    let cases = |items: &Vec<Value>, category: Option<&str>| -> Vec<KnowledgeRecord> {
        items
            .iter()
            .filter_map(|case| case.as_object())
            .filter_map(|case| record_from_case(case, category))
            .collect()
    };

    match value {
        Value::Array(items) => cases(items, None),
        Value::Object(obj) => {
            if let Some(Value::Array(items)) = obj.get("expert_training_cases") {
                cases(items, None)
            } else if let Some(Value::Object(by_category)) = obj.get("expert_knowledge") {
                by_category
                    .iter()
                    .filter_map(|(category, items)| items.as_array().map(|items| cases(items, Some(category.as_str()))))
                    .flatten()
                    .collect()
            } else if let Some(Value::Array(items)) = obj.get("data") {
                cases(items, None)
            } else {
                obj.iter()
                    .filter_map(|(key, items)| {
                        let items = items.as_array()?;
                        let first = items.first()?.as_object()?;
                        if first.contains_key("content") || first.contains_key("title") {
                            Some(cases(items, Some(key.as_str())))
                        } else {
                            None
                        }
                    })
                    .flatten()
                    .collect()
            }
        }
        _ => Vec::new(),
    }
}

/// Normalize one case object. Returns `None` when it has neither title nor content.
pub fn record_from_case(case: &Map<String, Value>, category: Option<&str>) -> Option<KnowledgeRecord> {
    let content = first_str(case, &["content", "description", "expert_answer"]).unwrap_or_default();
    let title = first_str(case, &["title", "name", "topic", "question"]).unwrap_or_default();
    if content.is_empty() && title.is_empty() {
        return None;
    }
    let title = if title.is_empty() { "Untitled".to_string() } else { title };

    let id = ["case_id", "id"]
        .iter()
        .find_map(|k| match case.get(*k) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| generate_id(&title, &content));

    let category = category
        .map(str::to_string)
        .or_else(|| first_str(case, &["category"]))
        .unwrap_or_else(|| "general".to_string());

    let quality = ["quality_score", "confidence"]
        .iter()
        .find_map(|k| case.get(*k).and_then(Value::as_f64))
        .map(|q| q as f32)
        .unwrap_or_else(default_quality);

    let mut keywords: Vec<String> = case
        .get("keywords")
        .and_then(Value::as_array)
        .map(|kws| kws.iter().filter_map(|k| k.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    keywords.extend(extract_keywords(&format!("{title} {content}")));
    dedup_case_insensitive(&mut keywords);

    Some(
        KnowledgeRecord::new(id, category, title)
            .with_body(content)
            .with_keywords(keywords)
            .with_technology(first_str(case, &["technology", "topic"]).unwrap_or_default())
            .with_quality(quality),
    )
}

/// Stable 12-hex id from title and content.
pub fn generate_id(title: &str, content: &str) -> String {
    let text: String = format!("{title}_{content}").chars().take(100).collect();
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")[..12].to_string()
}

/// Technical keywords: acronyms, IPs, port references, then vocabulary hits.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut found: Vec<String> = TECH_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
        .collect();

    let words: HashSet<String> = crate::search::tokenize(text).into_iter().collect();
    found.extend(
        TECH_VOCABULARY
            .iter()
            .filter(|kw| words.contains(**kw))
            .map(|kw| kw.to_string()),
    );

    dedup_case_insensitive(&mut found);
    found
}

fn first_str(case: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        case.get(*k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn dedup_case_insensitive(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("gennet-loader-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_training_cases_layout() {
        let doc = json!({
            "expert_training_cases": [
                {"case_id": "fw-1", "title": "Firewall rules", "content": "Order rules by hit count", "category": "cybersecurity", "quality_score": 92},
                {"title": "", "content": ""}
            ]
        });
        let records = parse_document(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "fw-1");
        assert_eq!(records[0].category, "cybersecurity");
        assert_eq!(records[0].quality, 92.0);
        assert!(records[0].keywords.iter().any(|k| k == "firewall"));
    }

    #[test]
    fn test_expert_knowledge_layout_sets_category() {
        let doc = json!({
            "expert_knowledge": {
                "networking": [{"name": "VLAN trunking", "description": "802.1Q tagging"}],
                "cloud": [{"topic": "EKS", "expert_answer": "Managed Kubernetes on AWS"}]
            }
        });
        let records = parse_document(&doc);
        assert_eq!(records.len(), 2);
        let vlan = records.iter().find(|r| r.title == "VLAN trunking").unwrap();
        assert_eq!(vlan.category, "networking");
        assert_eq!(vlan.body, "802.1Q tagging");
        let eks = records.iter().find(|r| r.title == "EKS").unwrap();
        assert_eq!(eks.technology, "EKS");
        assert_eq!(eks.body, "Managed Kubernetes on AWS");
    }

    #[test]
    fn test_data_array_and_bare_array() {
        let doc = json!({"data": [{"id": 7, "title": "DNS", "content": "Resolvers"}]});
        let records = parse_document(&doc);
        assert_eq!(records[0].id, "7");
        assert_eq!(records[0].category, "general");

        let doc = json!([{"question": "What is BGP?", "expert_answer": "Path vector protocol"}]);
        let records = parse_document(&doc);
        assert_eq!(records[0].title, "What is BGP?");
    }

    #[test]
    fn test_generic_object_keys() {
        let doc = json!({
            "version": "1.0",
            "tags": ["a", "b"],
            "devops": [{"title": "Helm charts", "content": "Package Kubernetes apps"}]
        });
        let records = parse_document(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "devops");
    }

    #[test]
    fn test_generated_id_is_stable() {
        let a = generate_id("Title", "Content");
        let b = generate_id("Title", "Content");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_ne!(a, generate_id("Other", "Content"));
    }

    #[test]
    fn test_extract_keywords() {
        let kws = extract_keywords("Configure OSPF and BGP on 10.0.0.1, open port 443 through the firewall");
        assert!(kws.contains(&"OSPF".to_string()));
        assert!(kws.contains(&"BGP".to_string()));
        assert!(kws.contains(&"10.0.0.1".to_string()));
        assert!(kws.contains(&"port 443".to_string()));
        assert!(kws.contains(&"firewall".to_string()));
        // "bgp" from the vocabulary collapses into the acronym
        assert_eq!(kws.iter().filter(|k| k.eq_ignore_ascii_case("bgp")).count(), 1);
    }

    #[test]
    fn test_vocabulary_matches_whole_words_only() {
        let kws = extract_keywords("zip archives");
        assert!(!kws.iter().any(|k| k == "ip"));
    }

    #[test]
    fn test_load_dir_skips_bad_files() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("a.json"),
            r#"{"data": [{"title": "SIEM tuning", "content": "Reduce false positives"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.join("b.json"), "{ not json").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
        let nested = dir.join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("c.json"), r#"[{"title": "WAF", "content": "Layer 7 filtering"}]"#).unwrap();

        let records = load_dir(&dir).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "SIEM tuning");
        assert_eq!(records[1].title, "WAF");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_dir_missing() {
        let err = load_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
