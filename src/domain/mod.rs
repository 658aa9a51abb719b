mod fingerprint;
mod provider;
mod provider_health;
mod request;
mod result;
mod task;
mod task_id;
mod task_state;

pub use fingerprint::Fingerprint;
pub use provider::{ProviderDescriptor, ProviderId, ProviderKind, QualityTier};
pub use provider_health::{CircuitState, ProviderHealth};
pub use request::{ClassificationRequest, DocumentMetadata};
pub use result::{ClassificationResult, TokenUsage, LABEL_PROCESSING_ERROR, LABEL_UNKNOWN};
pub use task::Task;
pub use task_id::TaskId;
pub use task_state::TaskState;
