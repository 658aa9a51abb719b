mod classification_service;
mod dispatcher;
mod escalation;
mod health_registry;

pub use classification_service::ClassificationService;
pub use dispatcher::{ClassificationJob, DispatchError, Dispatcher};
pub use escalation::{EscalationPolicy, EscalationReason};
pub use health_registry::{HealthRegistry, HealthSnapshot};
