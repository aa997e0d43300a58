//! Prompt enhancement with matched knowledge snippets.

use crate::search::SearchResult;

const CONTEXT_HEADER: &str = "Expert Knowledge Context:";
const MAX_BODY_CHARS: usize = 300;

/// Render up to `limit` results as a bullet block, or `None` when there is nothing to add.
pub fn build_context(results: &[SearchResult], limit: usize) -> Option<String> {
    if results.is_empty() || limit == 0 {
        return None;
    }

    let mut context = format!("{CONTEXT_HEADER}\n");
    for result in results.iter().take(limit) {
        let record = &result.record;
        let body = record.body.trim();
        if body.is_empty() {
            context.push_str(&format!("- {}\n", record.title));
        } else {
            context.push_str(&format!("- {}: {}\n", record.title, truncate(body, MAX_BODY_CHARS)));
        }
    }
    Some(context)
}

/// Prepend the knowledge block to `message`. With no results the message is returned unchanged.
pub fn enhance_prompt(message: &str, results: &[SearchResult], limit: usize) -> String {
    match build_context(results, limit) {
        Some(context) => format!("{context}\nUser Query: {message}"),
        None => message.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
