//! Shared completion call used by every agent.
//!
//! One attempt, bounded by a timeout, with the agent's own system prompt,
//! temperature and token limit. Blank completions count as failures.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vectormentor_config::AgentProfile;
use vectormentor_core::error::ProviderError;
use vectormentor_core::provider::{Provider, ProviderRequest};

/// A provider bound to one agent's profile.
#[derive(Clone)]
pub struct AgentLlm {
    role: &'static str,
    provider: Arc<dyn Provider>,
    model: String,
    profile: AgentProfile,
    timeout: Duration,
}

impl AgentLlm {
    pub fn new(
        role: &'static str,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        profile: AgentProfile,
        timeout: Duration,
    ) -> Self {
        Self {
            role,
            provider,
            model: model.into(),
            profile,
            timeout,
        }
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    /// Send `prompt` under this agent's system prompt and return the trimmed text.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut request =
            ProviderRequest::from_prompts(self.model.as_str(), &self.profile.system_prompt, prompt);
        request.temperature = self.profile.temperature;
        request.max_tokens = Some(self.profile.max_tokens);

        debug!(agent = self.role, provider = self.provider.name(), "Completion request");

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "{} call exceeded {}s",
                    self.role,
                    self.timeout.as_secs()
                ))
            })??;

        let text = response.message.content.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}
