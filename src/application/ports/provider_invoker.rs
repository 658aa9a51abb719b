use async_trait::async_trait;

use crate::domain::{ClassificationRequest, ClassificationResult, ProviderDescriptor};

/// One classification attempt against one remote provider: request
/// construction, the network call, and response parsing. Implementations
/// must return a structurally valid result or a typed failure; an
/// out-of-set label is substituted locally, never propagated.
#[async_trait]
pub trait ProviderInvoker: Send + Sync + std::fmt::Debug {
    fn descriptor(&self) -> &ProviderDescriptor;

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ProviderError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("attempt timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("rate limited by provider")]
    RateLimited,
    /// Provider answered, but the payload could not be decoded. Indicates
    /// provider misbehavior rather than unavailability.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Timeout => "timeout",
            ProviderError::Transport(_) => "transport_error",
            ProviderError::Auth(_) => "auth_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::MalformedResponse(_) => "malformed_response",
        }
    }
}
