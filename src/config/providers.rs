//! Built-in provider table and API-key naming conventions.

use std::collections::BTreeMap;

use super::ProviderInfo;

/// Provider key for OpenAI itself.
pub const OPENAI_PROVIDER: &str = "openai";

/// Environment variable consulted for OpenAI credentials.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Providers that serve models without any credential.
const NO_KEY_PROVIDERS: &[&str] = &["ollama"];

const BUILTIN_PROVIDERS: &[(&str, &str, &str, &str)] = &[
    ("openai", "OpenAI", "https://api.openai.com/v1", "OPENAI_API_KEY"),
    ("openrouter", "OpenRouter", "https://openrouter.ai/api/v1", "OPENROUTER_API_KEY"),
    (
        "azure",
        "AzureOpenAI",
        "https://YOUR_PROJECT_NAME.openai.azure.com/openai",
        "AZURE_OPENAI_API_KEY",
    ),
    (
        "gemini",
        "Gemini",
        "https://generativelanguage.googleapis.com/v1beta/openai",
        "GEMINI_API_KEY",
    ),
    ("ollama", "Ollama", "http://localhost:11434/v1", "OLLAMA_API_KEY"),
    ("mistral", "Mistral", "https://api.mistral.ai/v1", "MISTRAL_API_KEY"),
    ("deepseek", "DeepSeek", "https://api.deepseek.com", "DEEPSEEK_API_KEY"),
    ("xai", "xAI", "https://api.x.ai/v1", "XAI_API_KEY"),
    ("groq", "Groq", "https://api.groq.com/openai/v1", "GROQ_API_KEY"),
    ("arceeai", "ArceeAI", "https://conductor.arcee.ai/v1", "ARCEEAI_API_KEY"),
];

/// Built-in providers keyed by lowercase provider id.
pub fn builtin_providers() -> BTreeMap<String, ProviderInfo> {
    BUILTIN_PROVIDERS
        .iter()
        .map(|(key, name, base_url, env_key)| {
            (
                key.to_string(),
                ProviderInfo {
                    name: name.to_string(),
                    base_url: base_url.to_string(),
                    env_key: env_key.to_string(),
                },
            )
        })
        .collect()
}

/// True when `provider` is OpenAI (cached login credentials apply).
pub fn is_openai_provider(provider: &str) -> bool {
    provider.trim().eq_ignore_ascii_case(OPENAI_PROVIDER)
}

/// True when the provider is on the no-credential allow-list.
pub fn provider_requires_key(provider: &str) -> bool {
    let normalized = provider.trim().to_ascii_lowercase();
    !NO_KEY_PROVIDERS.contains(&normalized.as_str())
}

/// API-key env var for a provider.
///
/// Uses the provider table when it has an entry, otherwise the
/// `<PROVIDER>_API_KEY` convention.
pub fn api_key_env_var(provider: &str, providers: &BTreeMap<String, ProviderInfo>) -> String {
    let normalized = provider.trim().to_ascii_lowercase();
    if let Some(info) = providers.get(&normalized) {
        if !info.env_key.trim().is_empty() {
            return info.env_key.trim().to_string();
        }
    }
    format!("{}_API_KEY", env_prefix(&normalized))
}

/// Base-URL override env var for a provider (`<PROVIDER>_BASE_URL`).
pub fn base_url_env_var(provider: &str) -> String {
    format!("{}_BASE_URL", env_prefix(&provider.trim().to_ascii_lowercase()))
}

fn env_prefix(provider: &str) -> String {
    provider
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
