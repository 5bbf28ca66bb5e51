pub mod chat;

pub const DEFAULT_UPSTREAM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Server-side upstream settings. Nothing here is controllable by relay callers.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub completion_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub referer: String,
    pub title: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            completion_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            referer: "http://localhost:3000".to_string(),
            title: "AI Chatbot".to_string(),
        }
    }
}

impl LlmConfig {
    /// Credential with blank values treated as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// First ten characters of a credential followed by an ellipsis, for logs.
pub fn mask_api_key(key: &str) -> String {
    let prefix: String = key.chars().take(10).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credential_counts_as_missing() {
        let config = LlmConfig { api_key: Some("   ".into()), ..LlmConfig::default() };
        assert!(config.credential().is_none());
    }

    #[test]
    fn masked_key_keeps_short_prefix() {
        assert_eq!(mask_api_key("sk-or-v1-abcdef123456"), "sk-or-v1-a...");
        assert_eq!(mask_api_key("short"), "short...");
    }
}
