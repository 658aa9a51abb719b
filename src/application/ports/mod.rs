mod provider_invoker;
mod result_cache;
mod task_repository;

pub use provider_invoker::{ProviderError, ProviderInvoker};
pub use result_cache::ResultCache;
pub use task_repository::{TaskRepository, TaskRepositoryError};
