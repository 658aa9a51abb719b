use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{TaskRepository, TaskRepositoryError};
use crate::domain::{ClassificationResult, Task, TaskId, TaskState};

/// Process-local task store. Sufficient for the in-process dispatcher;
/// a durable backend would implement the same port.
pub struct MemoryTaskRepository {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        self.tasks
            .lock()
            .expect("task lock")
            .insert(task.id, task.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Task, TaskRepositoryError> {
        self.tasks
            .lock()
            .expect("task lock")
            .get(&id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(id))
    }

    async fn update_state(
        &self,
        id: TaskId,
        state: TaskState,
        result: Option<ClassificationResult>,
        error_message: Option<&str>,
    ) -> Result<(), TaskRepositoryError> {
        let mut tasks = self.tasks.lock().expect("task lock");
        let task = tasks.get_mut(&id).ok_or(TaskRepositoryError::NotFound(id))?;

        // Tasks only move forward; a terminal task never changes again.
        if task.state.is_terminal() {
            tracing::warn!(
                task_id = %id,
                current = %task.state,
                requested = %state,
                "Ignoring state update on terminal task"
            );
            return Ok(());
        }

        task.state = state;
        if result.is_some() {
            task.result = result;
        }
        if let Some(message) = error_message {
            task.error_message = Some(message.to_string());
        }
        task.updated_at = Utc::now();
        Ok(())
    }
}
