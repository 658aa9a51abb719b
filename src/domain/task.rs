use chrono::{DateTime, Utc};

use super::{ClassificationResult, TaskId, TaskState};

/// Handle for one asynchronously dispatched classification. States only
/// move forward; a task is never reused for another request.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub state: TaskState,
    pub result: Option<ClassificationResult>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            state: TaskState::Pending,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}
