use crate::config::{Provider, ProviderConfig};
use crate::core::error::ChatError;
use crate::providers::LlmProvider;
use crate::providers::openai_compatible::OpenAICompatibleProvider;
use std::collections::HashMap;
use std::env;

/// Attribution headers OpenRouter uses to identify the calling app.
const OPENROUTER_REFERER: &str = concat!("https://crates.io/crates/", env!("CARGO_PKG_NAME"));
const OPENROUTER_TITLE: &str = env!("CARGO_PKG_NAME");

type ProviderCreator =
    Box<dyn Fn(&ProviderConfig) -> Result<Box<dyn LlmProvider>, ChatError> + Send + Sync>;

pub struct ProviderFactory {
    creators: HashMap<Provider, ProviderCreator>,
}

/// API key from the config file, else from the provider's environment variable.
fn resolve_api_key(provider: Provider, config: &ProviderConfig) -> Result<String, ChatError> {
    let key = match &config.api_key {
        Some(key) => key.clone(),
        None => env::var(provider.api_key_env()).map_err(|_| {
            ChatError::Config(format!(
                "{} must be set from config or environment variable",
                provider.api_key_env()
            ))
        })?,
    };

    if key.trim().is_empty() {
        return Err(ChatError::Config(format!(
            "{} cannot be empty",
            provider.api_key_env()
        )));
    }
    Ok(key)
}

fn base_url(provider: Provider, config: &ProviderConfig) -> String {
    config
        .base_url
        .clone()
        .unwrap_or_else(|| provider.default_base_url().to_string())
}

impl ProviderFactory {
    pub fn new() -> Self {
        let mut creators = HashMap::new();

        creators.insert(
            Provider::OpenAI,
            Box::new(|config: &ProviderConfig| {
                let provider = OpenAICompatibleProvider::new(
                    "openai",
                    base_url(Provider::OpenAI, config),
                    resolve_api_key(Provider::OpenAI, config)?,
                    None,
                )?;
                Ok(Box::new(provider) as Box<dyn LlmProvider>)
            }) as ProviderCreator,
        );

        creators.insert(
            Provider::OpenRouter,
            Box::new(|config: &ProviderConfig| {
                let headers = HashMap::from([
                    ("HTTP-Referer".to_string(), OPENROUTER_REFERER.to_string()),
                    ("X-Title".to_string(), OPENROUTER_TITLE.to_string()),
                ]);
                let provider = OpenAICompatibleProvider::new(
                    "openrouter",
                    base_url(Provider::OpenRouter, config),
                    resolve_api_key(Provider::OpenRouter, config)?,
                    Some(headers),
                )?;
                Ok(Box::new(provider) as Box<dyn LlmProvider>)
            }) as ProviderCreator,
        );

        creators.insert(
            Provider::DeepSeek,
            Box::new(|config: &ProviderConfig| {
                let provider = OpenAICompatibleProvider::new(
                    "deepseek",
                    base_url(Provider::DeepSeek, config),
                    resolve_api_key(Provider::DeepSeek, config)?,
                    None,
                )?;
                Ok(Box::new(provider) as Box<dyn LlmProvider>)
            }) as ProviderCreator,
        );

        Self { creators }
    }

    pub fn create(
        &self,
        provider: &Provider,
        config: &ProviderConfig,
    ) -> Result<Box<dyn LlmProvider>, ChatError> {
        self.creators
            .get(provider)
            .ok_or_else(|| ChatError::Config(format!("Provider not found: {:?}", provider)))
            .and_then(|creator| creator(config))
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}
