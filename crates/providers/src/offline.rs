//! Offline provider: stands in when no text-completion service is configured.
//!
//! Every call fails with `NotConfigured`, so each agent takes its documented
//! fallback path without attempting network I/O.

use async_trait::async_trait;
use vectormentor_core::error::ProviderError;
use vectormentor_core::provider::{Provider, ProviderRequest, ProviderResponse};

pub struct OfflineProvider;

#[async_trait]
impl Provider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured(
            "no text-completion service configured (local-only mode)".into(),
        ))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(false)
    }
}
