//! Provider router: selects the text-completion provider from config.
//!
//! Without a usable API key the default provider is the offline one, which
//! puts the whole runtime into local-only mode.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use vectormentor_core::error::ProviderError;
use vectormentor_core::provider::Provider;

use crate::offline::OfflineProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Holds the configured providers and knows which one is the default.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Whether the default provider is the offline stand-in.
    pub fn is_offline(&self) -> bool {
        self.default().is_none_or(|p| p.name() == "offline")
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// Providers without a key (their own or the top-level one) are skipped. If
/// the default provider ends up missing, the offline provider takes its slot.
pub fn build_from_config(
    config: &vectormentor_config::AppConfig,
) -> Result<ProviderRouter, ProviderError> {
    let mut router = ProviderRouter::new(&config.default_provider);
    let timeout = Duration::from_secs(config.request_timeout_secs);

    for (name, provider_config) in &config.providers {
        let Some(api_key) = provider_config
            .api_key
            .as_deref()
            .or(config.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
        else {
            tracing::debug!(provider = %name, "Skipping provider without API key");
            continue;
        };

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        let provider = OpenAiCompatProvider::new(name, &base_url, api_key, timeout)?;
        router.register(name.clone(), Arc::new(provider));
    }

    if router.get(&config.default_provider).is_none() {
        match config.resolved_api_key() {
            Some(api_key) => {
                let base_url = default_base_url(&config.default_provider);
                let provider = OpenAiCompatProvider::new(
                    &config.default_provider,
                    &base_url,
                    api_key,
                    timeout,
                )?;
                router.register(config.default_provider.clone(), Arc::new(provider));
            }
            None => {
                tracing::warn!(
                    provider = %config.default_provider,
                    "No API key configured, running in local-only mode"
                );
                router.register(config.default_provider.clone(), Arc::new(OfflineProvider));
            }
        }
    }

    Ok(router)
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
