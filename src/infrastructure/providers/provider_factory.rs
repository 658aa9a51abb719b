use std::sync::Arc;

use crate::application::ports::ProviderInvoker;
use crate::config::ProviderSettings;
use crate::domain::ProviderKind;
use crate::infrastructure::providers::{AnthropicProvider, GeminiProvider, OpenAiProvider};

pub struct ProviderFactory;

#[derive(Debug, thiserror::Error)]
pub enum ProviderFactoryError {
    #[error("missing API key: provider '{provider}' reads {env}")]
    MissingApiKey { provider: String, env: String },
}

impl ProviderFactory {
    /// Builds one invoker per configured provider, preserving the
    /// configured order (the orchestrator's tie-break within a tier).
    pub fn create_all(
        settings: &[ProviderSettings],
    ) -> Result<Vec<Arc<dyn ProviderInvoker>>, ProviderFactoryError> {
        settings.iter().map(Self::create).collect()
    }

    pub fn create(
        settings: &ProviderSettings,
    ) -> Result<Arc<dyn ProviderInvoker>, ProviderFactoryError> {
        let api_key = settings
            .api_key()
            .ok_or_else(|| ProviderFactoryError::MissingApiKey {
                provider: settings.name.clone(),
                env: settings.api_key_env.clone(),
            })?;

        let descriptor = settings.descriptor();
        tracing::info!(
            provider = %descriptor.id,
            kind = descriptor.kind.as_str(),
            model = %descriptor.model,
            tier = %descriptor.tier,
            "Configuring classification provider"
        );

        Ok(match descriptor.kind {
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(descriptor, api_key)),
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(descriptor, api_key)),
            ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(descriptor, api_key)),
        })
    }
}
