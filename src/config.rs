use crate::dispatch::BackendSelector;
use crate::error::{BridgeError, Result};
use crate::providers::{Protocol, ProviderPreset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub backend: BackendSelector,
    #[serde(default = "default_primary")]
    pub primary: EndpointConfig,
    pub secondary: EndpointConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Where one protocol's requests go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Required for providers without a preset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

/// Fallback temperature per call site, used when a request carries none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_executor_temperature")]
    pub executor_temperature: f64,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_eval_tool")]
    pub eval_tool: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            executor_temperature: default_executor_temperature(),
            chat_temperature: default_chat_temperature(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
            eval_tool: default_eval_tool(),
        }
    }
}

fn default_port() -> u16 {
    4300
}

fn default_primary() -> EndpointConfig {
    EndpointConfig {
        provider: "anthropic".to_string(),
        base_url: None,
        api_key_env: None,
        protocol: None,
    }
}

fn default_executor_temperature() -> f64 {
    0.0
}

fn default_chat_temperature() -> f64 {
    0.1
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u64 {
    1024
}

fn default_eval_tool() -> String {
    "evaluate".to_string()
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Each endpoint must speak the protocol of the role it is configured for.
    pub fn validate(&self) -> Result<()> {
        for (role, endpoint, expected) in [
            ("primary", &self.primary, Protocol::Primary),
            ("secondary", &self.secondary, Protocol::Secondary),
        ] {
            let actual = endpoint.protocol();
            if actual != expected {
                return Err(BridgeError::config(format!(
                    "[{role}] provider '{}' speaks the {actual:?} protocol, expected {expected:?}",
                    endpoint.provider
                )));
            }
        }
        Ok(())
    }

    /// Search standard locations for a config file.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        let candidates = config_search_paths();
        for candidate in &candidates {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(candidate);
            }
        }

        Err(BridgeError::config(format!(
            "No config file found. Searched: {}",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

impl EndpointConfig {
    fn preset(&self) -> Option<&'static ProviderPreset> {
        ProviderPreset::from_name(&self.provider)
    }

    /// Resolve the effective base URL (config override or provider preset default)
    pub fn effective_base_url(&self) -> Result<String> {
        if let Some(ref url) = self.base_url {
            return Ok(url.clone());
        }

        let preset = self.preset().ok_or_else(|| {
            BridgeError::config(format!(
                "Unknown provider '{}' and no base_url configured. Known providers: {}",
                self.provider,
                ProviderPreset::all()
                    .iter()
                    .map(|p| p.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        Ok(preset.base_url.to_string())
    }

    /// Explicit `protocol`, else the preset's. Unknown providers are assumed
    /// to be OpenAI-compatible.
    pub fn protocol(&self) -> Protocol {
        self.protocol
            .or_else(|| self.preset().map(|p| p.protocol))
            .unwrap_or(Protocol::Secondary)
    }

    /// Name of the environment variable holding the API key.
    pub fn api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .or_else(|| self.preset().map(|p| p.default_api_key_env.to_string()))
            .unwrap_or_else(|| "API_KEY".to_string())
    }

    /// Resolve the API key from the configured environment variable.
    ///
    /// A missing key is not an error: local backends commonly run without one.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(self.api_key_env()).ok()
    }
}

fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("llm-bridge.toml")];

    if cfg!(target_os = "macos") {
        if let Some(home) = home_dir() {
            paths.push(
                home.join("Library")
                    .join("Application Support")
                    .join("llm-bridge")
                    .join("config.toml"),
            );
        }
    } else {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("llm-bridge").join("config.toml"));
        }
        if let Some(home) = home_dir() {
            paths.push(home.join(".config").join("llm-bridge").join("config.toml"));
        }
    }

    if let Some(home) = home_dir() {
        paths.push(home.join(".llm-bridge.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
