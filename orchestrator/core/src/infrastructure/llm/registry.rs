// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resolves model aliases to concrete [`LLMProvider`] instances, with
//! retry-with-backoff and a single fallback provider (spec §9 "Retries with
//! Retry-After": one policy object consumed uniformly, not ad-hoc loops).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::llm::{GenerationOptions, GenerationResponse, LLMError, LLMProvider};

use super::anthropic::AnthropicAdapter;
use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;

/// One alias a provider exposes, e.g. `"default"` -> `"llama3.2"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAlias {
    pub alias: String,
    pub model: String,
}

/// Declarative configuration for a single provider instance. `api_key`
/// supports `"env:VAR_NAME"` indirection so secrets never live in a
/// checked-in config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub provider_type: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub models: Vec<ModelAlias>,
}

fn default_true() -> bool {
    true
}

/// The registry's full configuration, loaded alongside the rest of the
/// process config (spec §1 ambient stack).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LLMRegistryConfig {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub fallback_provider: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Registry for managing LLM providers and resolving model aliases.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LLMProvider>>,
    alias_map: HashMap<String, String>,
    fallback_provider: Option<String>,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl ProviderRegistry {
    /// Builds a registry from config. Providers that fail to initialize
    /// (e.g. missing API key) are skipped with a warning rather than
    /// failing the whole registry.
    pub fn from_config(config: &LLMRegistryConfig) -> anyhow::Result<Self> {
        let mut providers = HashMap::new();
        let mut alias_map = HashMap::new();

        info!("initializing LLM provider registry");

        for provider_config in &config.providers {
            if !provider_config.enabled {
                info!(provider = %provider_config.name, "provider disabled, skipping");
                continue;
            }

            match Self::create_provider(provider_config) {
                Ok(provider) => {
                    providers.insert(provider_config.name.clone(), provider);
                    for model in &provider_config.models {
                        info!(
                            alias = %model.alias,
                            model = %model.model,
                            provider = %provider_config.name,
                            "mapped model alias"
                        );
                        alias_map.insert(model.alias.clone(), provider_config.name.clone());
                    }
                }
                Err(e) => {
                    warn!(provider = %provider_config.name, error = %e, "failed to initialize provider");
                }
            }
        }

        if providers.is_empty() {
            warn!("no LLM providers configured");
        }

        Ok(Self {
            providers,
            alias_map,
            fallback_provider: config.fallback_provider.clone(),
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    fn create_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let api_key = Self::resolve_api_key(&config.api_key)?;
        let model = config
            .models
            .first()
            .ok_or_else(|| anyhow::anyhow!("no models configured for provider {}", config.name))?
            .model
            .clone();

        let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
            "openai" | "openai-compatible" => Arc::new(OpenAIAdapter::new(config.endpoint.clone(), api_key, model)),
            "ollama" => Arc::new(OllamaAdapter::new(config.endpoint.clone(), model)),
            "anthropic" => Arc::new(AnthropicAdapter::new(api_key, model)),
            other => anyhow::bail!("unsupported provider type: {other}"),
        };

        Ok(provider)
    }

    fn resolve_api_key(key: &Option<String>) -> anyhow::Result<String> {
        match key {
            Some(k) if k.starts_with("env:") => {
                let var_name = k.strip_prefix("env:").unwrap();
                std::env::var(var_name).map_err(|_| anyhow::anyhow!("environment variable not set: {var_name}"))
            }
            Some(k) => Ok(k.clone()),
            None => Ok(String::new()),
        }
    }

    /// Generates via a model alias. Retries with exponential backoff, then
    /// falls through to `fallback_provider` on the last attempt if one is
    /// configured (spec §9 "Retries with Retry-After" policy shape).
    pub async fn generate(
        &self,
        alias: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let provider_name = self
            .alias_map
            .get(alias)
            .ok_or_else(|| LLMError::ModelNotFound(format!("model alias '{alias}' not found")))?;

        let provider = self
            .providers
            .get(provider_name)
            .ok_or_else(|| LLMError::Provider(format!("provider '{provider_name}' not found")))?;

        let mut last_error = None;

        for attempt in 0..self.max_retries {
            match provider.generate(prompt, options).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(attempt = attempt + 1, max = self.max_retries, error = %e, "generation attempt failed");
                    last_error = Some(e);

                    if attempt == self.max_retries - 1 {
                        if let Some(fallback) = &self.fallback_provider {
                            if let Some(fallback_provider) = self.providers.get(fallback) {
                                info!(provider = %fallback, "falling back to secondary provider");
                                return fallback_provider.generate(prompt, options).await;
                            }
                        }
                    } else {
                        tokio::time::sleep(tokio::time::Duration::from_millis(
                            self.retry_delay_ms * 2_u64.pow(attempt),
                        ))
                        .await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LLMError::Provider("unknown error".into())))
    }

    pub async fn health_check_all(&self) -> HashMap<String, Result<(), LLMError>> {
        let mut results = HashMap::new();
        for (name, provider) in &self.providers {
            results.insert(name.clone(), provider.health_check().await);
        }
        results
    }

    pub fn available_aliases(&self) -> Vec<String> {
        self.alias_map.keys().cloned().collect()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias_map.contains_key(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_creation_maps_alias_to_provider() {
        let config = LLMRegistryConfig {
            providers: vec![ProviderConfig {
                name: "local-ollama".to_string(),
                provider_type: "ollama".to_string(),
                endpoint: "http://localhost:11434".to_string(),
                api_key: None,
                enabled: true,
                models: vec![ModelAlias { alias: "default".to_string(), model: "llama3.2".to_string() }],
            }],
            fallback_provider: None,
            max_retries: 3,
            retry_delay_ms: 10,
        };

        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert!(registry.has_alias("default"));
        assert_eq!(registry.available_aliases().len(), 1);
    }

    #[test]
    fn disabled_provider_is_skipped() {
        let config = LLMRegistryConfig {
            providers: vec![ProviderConfig {
                name: "disabled".to_string(),
                provider_type: "ollama".to_string(),
                endpoint: String::new(),
                api_key: None,
                enabled: false,
                models: vec![ModelAlias { alias: "default".to_string(), model: "x".to_string() }],
            }],
            fallback_provider: None,
            max_retries: 1,
            retry_delay_ms: 1,
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert!(!registry.has_alias("default"));
    }
}
