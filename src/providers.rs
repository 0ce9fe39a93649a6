//! Built-in endpoint presets for common LLM API providers.
//!
//! A preset names the base URL, the wire protocol the provider speaks and the
//! environment variable conventionally holding its API key, so a config file
//! only needs `provider = "groq"` to be usable.

use serde::{Deserialize, Serialize};

/// Wire protocol spoken by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Anthropic Messages shape.
    Primary,
    /// OpenAI-compatible chat completions shape.
    Secondary,
}

#[derive(Debug, Clone)]
pub struct ProviderPreset {
    pub name: &'static str,
    pub base_url: &'static str,
    pub protocol: Protocol,
    pub default_api_key_env: &'static str,
}

const PRESETS: &[ProviderPreset] = &[
    ProviderPreset {
        name: "anthropic",
        base_url: "https://api.anthropic.com",
        protocol: Protocol::Primary,
        default_api_key_env: "ANTHROPIC_API_KEY",
    },
    ProviderPreset {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        protocol: Protocol::Secondary,
        default_api_key_env: "OPENAI_API_KEY",
    },
    ProviderPreset {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        protocol: Protocol::Secondary,
        default_api_key_env: "OPENROUTER_API_KEY",
    },
    ProviderPreset {
        name: "groq",
        base_url: "https://api.groq.com/openai/v1",
        protocol: Protocol::Secondary,
        default_api_key_env: "GROQ_API_KEY",
    },
    ProviderPreset {
        name: "together",
        base_url: "https://api.together.xyz/v1",
        protocol: Protocol::Secondary,
        default_api_key_env: "TOGETHER_API_KEY",
    },
    ProviderPreset {
        name: "deepseek",
        base_url: "https://api.deepseek.com/v1",
        protocol: Protocol::Secondary,
        default_api_key_env: "DEEPSEEK_API_KEY",
    },
    ProviderPreset {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        protocol: Protocol::Secondary,
        default_api_key_env: "OLLAMA_API_KEY",
    },
];

impl ProviderPreset {
    #[must_use]
    pub fn from_name(name: &str) -> Option<&'static ProviderPreset> {
        let name = name.to_lowercase();
        PRESETS.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn all() -> &'static [ProviderPreset] {
        PRESETS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers() {
        assert!(ProviderPreset::from_name("openai").is_some());
        assert!(ProviderPreset::from_name("Groq").is_some()); // case-insensitive
        assert!(ProviderPreset::from_name("unknown_provider").is_none());
    }

    #[test]
    fn test_only_anthropic_speaks_primary() {
        for preset in ProviderPreset::all() {
            let expected = if preset.name == "anthropic" {
                Protocol::Primary
            } else {
                Protocol::Secondary
            };
            assert_eq!(preset.protocol, expected, "provider {}", preset.name);
        }
    }
}
