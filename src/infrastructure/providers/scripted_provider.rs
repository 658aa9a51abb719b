use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{ProviderError, ProviderInvoker};
use crate::domain::{ClassificationRequest, ClassificationResult, ProviderDescriptor};

/// Scripted in-memory provider. Answers from a queue of canned outcomes
/// and counts invocations, which is what orchestrator and circuit tests
/// need to observe. When the script runs dry the last outcome repeats.
#[derive(Debug)]
pub struct ScriptedProvider {
    descriptor: ProviderDescriptor,
    script: Mutex<VecDeque<Result<ClassificationResult, ProviderError>>>,
    last: Mutex<Option<Result<ClassificationResult, ProviderError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_outcome(self, outcome: Result<ClassificationResult, ProviderError>) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .push_back(outcome);
        self
    }

    /// Sleep before answering, to trip the orchestrator's attempt timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderInvoker for ScriptedProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().expect("script lock").pop_front();
        match next {
            Some(outcome) => {
                *self.last.lock().expect("script lock") = Some(outcome.clone());
                outcome
            }
            None => self
                .last
                .lock()
                .expect("script lock")
                .clone()
                .unwrap_or_else(|| {
                    Err(ProviderError::Transport("script exhausted".to_string()))
                }),
        }
    }
}
