use async_trait::async_trait;

use crate::domain::{ClassificationResult, Task, TaskId, TaskState};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<(), TaskRepositoryError>;

    async fn get_by_id(&self, id: TaskId) -> Result<Task, TaskRepositoryError>;

    async fn update_state(
        &self,
        id: TaskId,
        state: TaskState,
        result: Option<ClassificationResult>,
        error_message: Option<&str>,
    ) -> Result<(), TaskRepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TaskRepositoryError {
    /// Polling an identifier that was never issued. Distinct from a task
    /// that exists but has not completed yet.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("storage error: {0}")]
    Storage(String),
}
