//! Chat provider presets and settings.

use std::str::FromStr;

use super::error::ChatError;

/// Substring that marks an API key as an unfilled placeholder.
const PLACEHOLDER_MARKER: &str = "your_";

/// Supported chat completion providers.
///
/// Names parse case-insensitively, so `DEFAULT_MODEL=DeepSeek` works.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatProvider {
    #[default]
    Deepseek,
    Openai,
    Groq,
}

impl ChatProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatProvider::Deepseek => "deepseek",
            ChatProvider::Openai => "openai",
            ChatProvider::Groq => "groq",
        }
    }

    /// Base URL used when `<PROVIDER>_API_BASE` is not set.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ChatProvider::Deepseek => "https://api.deepseek.com/v1",
            ChatProvider::Openai => "https://api.openai.com/v1",
            ChatProvider::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ChatProvider::Deepseek => "deepseek-chat",
            ChatProvider::Openai => "gpt-4-turbo",
            ChatProvider::Groq => "llama3-8b-8192",
        }
    }

    /// Environment variable holding the API key, e.g. `DEEPSEEK_API_KEY`.
    pub fn api_key_var(&self) -> String {
        format!("{}_API_KEY", self.as_str().to_uppercase())
    }

    /// Environment variable overriding the base URL, e.g. `DEEPSEEK_API_BASE`.
    pub fn api_base_var(&self) -> String {
        format!("{}_API_BASE", self.as_str().to_uppercase())
    }
}

impl std::fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(ChatProvider::Deepseek),
            "openai" => Ok(ChatProvider::Openai),
            "groq" => Ok(ChatProvider::Groq),
            other => Err(format!("unknown chat provider '{other}'")),
        }
    }
}

/// Resolved settings for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub provider: ChatProvider,
    /// None when the key is absent, empty or a placeholder
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ChatSettings {
    /// Resolves settings using `lookup` to read variables.
    pub fn from_lookup<F>(provider: ChatProvider, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(&provider.api_key_var())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && !key.contains(PLACEHOLDER_MARKER));

        let base_url = lookup(&provider.api_base_var())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        Self {
            provider,
            api_key,
            base_url,
            model: provider.default_model().to_string(),
        }
    }

    /// Resolves settings from the process environment.
    pub fn from_env(provider: ChatProvider) -> Self {
        Self::from_lookup(provider, |name| std::env::var(name).ok())
    }

    /// Overrides the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Returns true if an API key is available.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the API key.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` if no usable key was found.
    pub fn api_key(&self) -> Result<&str, ChatError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ChatError::NotConfigured {
                provider: self.provider.to_string(),
                key_var: self.provider.api_key_var(),
            })
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
