//! Provider registry: the fixed set of chat providers GenNet can fall back across.
//!
//! Entries are declared in fallback order. The unified `OpenAiCompatibleProvider`
//! uses these definitions to talk to each backend.

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Attribution headers OpenRouter asks clients to send.
static OPENROUTER_HEADERS: &[(&str, &str)] = &[
    ("HTTP-Referer", "https://opengennet.ai"),
    ("X-Title", "OpenGenNet AI API"),
];

/// Static definition of one provider.
#[derive(Debug, Clone)]
pub struct ProviderDef {
    /// Stable key used in requests and responses.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    pub model: &'static str,
    pub base_url: &'static str,
    /// Appended to `base_url`.
    pub chat_path: &'static str,
    /// Environment variable holding the API key.
    pub env_key: &'static str,
    pub specialty: &'static str,
    /// Extra headers sent with every request.
    pub extra_headers: &'static [(&'static str, &'static str)],
}

impl ProviderDef {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.chat_path)
    }
}

// ─── Provider Definitions ────────────────────────────────────────────────────

static PROVIDERS: &[ProviderDef] = &[
    ProviderDef {
        key: "groq_fast",
        name: "Groq LLaMA 3.1 8B",
        model: "llama-3.1-8b-instant",
        base_url: GROQ_BASE_URL,
        chat_path: "/chat/completions",
        env_key: "GROQ_FAST_KEY",
        specialty: "Fast general responses",
        extra_headers: &[],
    },
    ProviderDef {
        key: "groq_coding",
        name: "Groq Gemma2 9B",
        model: "gemma2-9b-it",
        base_url: GROQ_BASE_URL,
        chat_path: "/chat/completions",
        env_key: "GROQ_CODING_KEY",
        specialty: "Coding & technical tasks",
        extra_headers: &[],
    },
    ProviderDef {
        key: "deepseek",
        name: "DeepSeek R1",
        model: "deepseek/deepseek-r1",
        base_url: OPENROUTER_BASE_URL,
        chat_path: "/chat/completions",
        env_key: "DEEPSEEK_KEY",
        specialty: "Complex reasoning",
        extra_headers: OPENROUTER_HEADERS,
    },
    ProviderDef {
        key: "qwen",
        name: "Qwen 2.5 72B",
        model: "qwen/qwen-2.5-72b-instruct",
        base_url: OPENROUTER_BASE_URL,
        chat_path: "/chat/completions",
        env_key: "QWEN_KEY",
        specialty: "Comprehensive knowledge",
        extra_headers: OPENROUTER_HEADERS,
    },
];

/// Map an alias to its canonical provider key. Unknown names pass through.
pub fn canonical_key(name: &str) -> &str {
    match name {
        "groq" => "groq_fast",
        "deepseek_reasoning" => "deepseek",
        "qwen_general" => "qwen",
        other => other,
    }
}

/// Look up a provider definition by key or alias.
pub fn get_provider_def(name: &str) -> Option<&'static ProviderDef> {
    let key = canonical_key(name);
    PROVIDERS.iter().find(|p| p.key == key)
}

/// All definitions, in fallback order.
pub fn all_providers() -> &'static [ProviderDef] {
    PROVIDERS
}

/// List all known provider keys.
pub fn all_provider_keys() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.key).collect()
}
