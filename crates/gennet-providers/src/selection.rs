//! Content-based provider preference.

const CODING_KEYWORDS: &[&str] = &[
    "code", "python", "function", "programming", "script", "debug", "algorithm",
    "implement", "api", "sql", "javascript", "html", "css",
];

const REASONING_KEYWORDS: &[&str] = &[
    "analyze", "compare", "explain why", "reasoning", "complex", "strategy",
    "philosophy", "pros and cons", "evaluate",
];

const LONG_FORM_KEYWORDS: &[&str] = &[
    "detailed", "comprehensive", "complete guide", "tutorial", "step by step",
];

const LONG_MESSAGE_CHARS: usize = 200;

/// Pick the provider best suited to `message`. The result is only a preference;
/// fallback still runs when it is unavailable.
pub fn route_by_content(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|kw| lower.contains(kw));

    if mentions(CODING_KEYWORDS) {
        "groq_coding"
    } else if mentions(REASONING_KEYWORDS) {
        "deepseek"
    } else if message.chars().count() > LONG_MESSAGE_CHARS || mentions(LONG_FORM_KEYWORDS) {
        "qwen"
    } else {
        "groq_fast"
    }
}
