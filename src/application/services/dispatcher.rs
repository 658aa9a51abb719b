use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::Instrument;

use crate::application::ports::{TaskRepository, TaskRepositoryError};
use crate::application::services::ClassificationService;
use crate::domain::{ClassificationRequest, Task, TaskId, TaskState};

pub struct ClassificationJob {
    pub task_id: TaskId,
    pub request: ClassificationRequest,
}

/// Accepts classification requests and returns a task handle immediately;
/// the fallback sequence runs on a fixed pool of workers consuming a
/// bounded queue, so in-flight provider calls stay bounded too.
pub struct Dispatcher {
    sender: mpsc::Sender<ClassificationJob>,
    tasks: Arc<dyn TaskRepository>,
}

impl Dispatcher {
    /// Spawns `workers` consumers over a queue of `queue_depth` slots.
    pub fn spawn(
        service: Arc<ClassificationService>,
        tasks: Arc<dyn TaskRepository>,
        workers: usize,
        queue_depth: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        for worker_id in 0..workers.max(1) {
            let worker = ClassificationWorker {
                worker_id,
                receiver: Arc::clone(&receiver),
                service: Arc::clone(&service),
                tasks: Arc::clone(&tasks),
            };
            tokio::spawn(worker.run());
        }

        Self { sender, tasks }
    }

    /// Creates a PENDING task and enqueues the request. Returns without
    /// waiting on any provider call; only queue backpressure can delay it.
    pub async fn submit(&self, request: ClassificationRequest) -> Result<TaskId, DispatchError> {
        let task = Task::new();
        let task_id = task.id;
        self.tasks.create(&task).await?;

        self.sender
            .send(ClassificationJob { task_id, request })
            .await
            .map_err(|_| DispatchError::QueueClosed)?;

        tracing::debug!(task_id = %task_id, "Classification task queued");
        Ok(task_id)
    }

    /// Current snapshot of a task. An identifier that was never issued is
    /// `TaskRepositoryError::NotFound`; a PENDING task is a normal answer.
    pub async fn poll(&self, task_id: TaskId) -> Result<Task, TaskRepositoryError> {
        self.tasks.get_by_id(task_id).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("task repository: {0}")]
    Repository(#[from] TaskRepositoryError),
    #[error("dispatch queue closed")]
    QueueClosed,
}

struct ClassificationWorker {
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<ClassificationJob>>>,
    service: Arc<ClassificationService>,
    tasks: Arc<dyn TaskRepository>,
}

impl ClassificationWorker {
    async fn run(self) {
        tracing::info!(worker_id = self.worker_id, "Classification worker started");
        loop {
            // Hold the lock only for the dequeue so siblings keep draining.
            let job = self.receiver.lock().await.recv().await;
            let Some(job) = job else {
                break;
            };

            let span = tracing::info_span!(
                "classification_task",
                task_id = %job.task_id,
                worker_id = self.worker_id,
            );

            if let Err(e) = self.process_job(job).instrument(span).await {
                tracing::error!(error = %e, "Classification task bookkeeping failed");
            }
        }
        tracing::info!(worker_id = self.worker_id, "Classification worker stopped: queue closed");
    }

    async fn process_job(&self, job: ClassificationJob) -> Result<(), TaskRepositoryError> {
        self.tasks
            .update_state(job.task_id, TaskState::Running, None, None)
            .await?;

        let result = self.service.classify(&job.request).await;

        if result.is_processing_error() {
            let detail = result.rationale.clone();
            self.tasks
                .update_state(
                    job.task_id,
                    TaskState::Failed,
                    Some(result),
                    detail.as_deref(),
                )
                .await?;
        } else {
            self.tasks
                .update_state(job.task_id, TaskState::Done, Some(result), None)
                .await?;
        }
        Ok(())
    }
}
