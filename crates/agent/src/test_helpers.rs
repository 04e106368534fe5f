//! Shared test doubles for agent tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use vectormentor_config::AgentProfile;
use vectormentor_core::error::ProviderError;
use vectormentor_core::message::Message;
use vectormentor_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

use crate::llm::AgentLlm;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next entry and records the user prompt.
/// Panics if more calls are made than entries provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Successful text responses, in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// User prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = prompts.len();

        if index >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                index,
                responses.len()
            );
        }

        let user_prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        prompts.push(user_prompt);
        responses[index].clone()
    }
}

/// Fails every call with a network error.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// Sleeps before answering.
pub struct SlowProvider(pub Duration);

#[async_trait::async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(make_text_response("tarde"))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn profile() -> AgentProfile {
    AgentProfile {
        temperature: 0.3,
        max_tokens: 300,
        system_prompt: "Eres un agente de prueba.".into(),
    }
}

pub fn llm(role: &'static str, provider: Arc<dyn Provider>) -> AgentLlm {
    AgentLlm::new(role, provider, "mock-model", profile(), Duration::from_secs(5))
}
