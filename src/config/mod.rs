use crate::cli::Args;
use crate::core::error::ChatError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "gpt-4-0613";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    OpenRouter,
    DeepSeek,
}

impl FromStr for Provider {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "openrouter" => Ok(Provider::OpenRouter),
            "deepseek" => Ok(Provider::DeepSeek),
            other => Err(ChatError::Config(format!("Unsupported provider: {}", other))),
        }
    }
}

impl Provider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Which optional built-in functions the model may call.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionsConfig {
    /// Allows `run_shell_command`. Off unless explicitly enabled.
    pub shell: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub active_provider: Option<Provider>,
    pub model: String,
    pub system_prompt: Option<String>,
    pub clear_screen: bool,
    pub providers: HashMap<Provider, ProviderConfig>,
    pub functions: FunctionsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_provider: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            clear_screen: true,
            providers: HashMap::new(),
            functions: FunctionsConfig::default(),
        }
    }
}

/// Effective settings for one session, after CLI flags are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: Provider,
    pub provider_config: ProviderConfig,
    pub model: String,
    pub system_prompt: Option<String>,
    pub clear_screen: bool,
    pub functions: FunctionsConfig,
}

impl Config {
    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chainchat")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn history_dir() -> PathBuf {
        Self::config_dir().join("history")
    }

    pub fn input_history_path() -> PathBuf {
        Self::config_dir().join("input_history.txt")
    }

    pub fn load() -> Result<Config, ChatError> {
        Self::load_from(&Self::config_path())
    }

    /// Reads the config at `path`, writing a default one if it does not exist.
    pub fn load_from(path: &Path) -> Result<Config, ChatError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config = serde_yml::from_str::<Config>(&contents)
                .map_err(|e| ChatError::Config(format!("Parse {}: {}", path.display(), e)))?;
            debug!(path = %path.display(), "loaded config");
            return Ok(config);
        }

        let config = Config::default();
        config.save_to(path)?;
        info!(path = %path.display(), "wrote default config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ChatError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(self)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }

    /// Merges command-line flags over the file. Flags win.
    pub fn resolve(&self, args: &Args) -> Result<Settings, ChatError> {
        let provider = match &args.provider {
            Some(name) => name.parse()?,
            None => self.active_provider.unwrap_or_default(),
        };

        let mut provider_config = self.providers.get(&provider).cloned().unwrap_or_default();
        if let Some(base_url) = &args.base_url {
            provider_config.base_url = Some(base_url.clone());
        }

        let model = args
            .model
            .clone()
            .or_else(|| provider_config.model.clone())
            .unwrap_or_else(|| self.model.clone());

        let system_prompt = args
            .system
            .clone()
            .or_else(|| self.system_prompt.clone())
            .filter(|prompt| !prompt.trim().is_empty());

        Ok(Settings {
            provider,
            provider_config,
            model,
            system_prompt,
            clear_screen: self.clear_screen && !args.no_clear,
            functions: self.functions.clone(),
        })
    }
}
