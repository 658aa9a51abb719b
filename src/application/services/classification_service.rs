use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::application::ports::{ProviderError, ProviderInvoker, ResultCache};
use crate::application::services::{EscalationPolicy, HealthRegistry, HealthSnapshot};
use crate::domain::{ClassificationRequest, ClassificationResult, Fingerprint, QualityTier};

/// Drives the ordered attempt sequence across providers: cache lookup,
/// circuit-breaker gating, sequential invocation, escalation on weak
/// results, fallback on failures. Attempts for a single request are
/// strictly sequential; different requests may run fully in parallel.
pub struct ClassificationService {
    /// Configuration order; ties within a quality tier keep this order.
    providers: Vec<Arc<dyn ProviderInvoker>>,
    health: Arc<HealthRegistry>,
    cache: Arc<dyn ResultCache>,
    policy: EscalationPolicy,
    attempt_timeout: Duration,
}

impl ClassificationService {
    pub fn new(
        providers: Vec<Arc<dyn ProviderInvoker>>,
        health: Arc<HealthRegistry>,
        cache: Arc<dyn ResultCache>,
        policy: EscalationPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            health,
            cache,
            policy,
            attempt_timeout,
        }
    }

    /// Per-provider circuit state and failure counts, for the diagnostics
    /// surface.
    pub fn provider_health(&self) -> Vec<HealthSnapshot> {
        self.health.snapshot()
    }

    /// Synchronous entry point: runs the fallback sequence to completion
    /// on the caller's own task. Always returns a structurally valid
    /// result; exhaustion is encoded as the `processing_error` sentinel.
    #[tracing::instrument(
        skip(self, request),
        fields(filename = %request.metadata.filename)
    )]
    pub async fn classify(&self, request: &ClassificationRequest) -> ClassificationResult {
        let started = Instant::now();
        let fingerprint = Fingerprint::of_request(request);

        if let Some(mut hit) = self.cache.get(&fingerprint) {
            hit.cached = true;
            self.emit_terminal(&hit, started, None);
            return hit;
        }

        let result = self.run_fallback_sequence(request, started).await;

        if !result.is_processing_error() {
            self.cache.put(fingerprint, result.clone());
        }
        result
    }

    async fn run_fallback_sequence(
        &self,
        request: &ClassificationRequest,
        started: Instant,
    ) -> ClassificationResult {
        let candidates = self.candidates_for(request);
        if candidates.is_empty() {
            let result =
                ClassificationResult::processing_error("no provider meets the request constraints");
            self.emit_terminal(&result, started, Some("exhausted"));
            return result;
        }

        // Latest structurally valid result, kept as the best-effort answer
        // should every remaining candidate fail.
        let mut best: Option<ClassificationResult> = None;
        let mut last_failure: Option<String> = None;
        let mut last_failure_kind: Option<&'static str> = None;
        let mut escalated = false;
        let mut index = 0;

        while index < candidates.len() {
            let invoker = &candidates[index];
            let descriptor = invoker.descriptor();

            if !self.health.may_attempt(&descriptor.id) {
                tracing::debug!(provider = %descriptor.id, "Skipping provider: circuit open");
                last_failure = Some(format!("circuit open for {}", descriptor.id));
                last_failure_kind = Some("circuit_open");
                index += 1;
                continue;
            }

            let attempt = match timeout(self.attempt_timeout, invoker.classify(request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Timeout),
            };

            match attempt {
                Err(error) => {
                    tracing::warn!(
                        provider = %descriptor.id,
                        kind = error.kind(),
                        error = %error,
                        "Provider attempt failed, falling back"
                    );
                    self.health.record_failure(&descriptor.id);
                    last_failure = Some(format!("{}: {}", descriptor.id, error));
                    last_failure_kind = Some(error.kind());
                    index += 1;
                }
                Ok(mut result) => {
                    self.health.record_success(&descriptor.id);
                    result.escalated = escalated;
                    result.estimated_cost = descriptor.cost_per_call;

                    let reason = self.policy.escalation_reason(&result);
                    let next_tier = match reason {
                        Some(_) => next_higher_tier(&candidates, index, descriptor.tier),
                        None => None,
                    };

                    match (reason, next_tier) {
                        (Some(reason), Some(next_index)) => {
                            tracing::info!(
                                provider = %descriptor.id,
                                confidence = result.confidence,
                                reason = reason.as_str(),
                                "Escalating to higher-tier provider"
                            );
                            replace_best(&mut best, result);
                            escalated = true;
                            index = next_index;
                        }
                        _ => {
                            // Confident enough, or no higher tier remains:
                            // accept rather than loop.
                            self.emit_terminal(&result, started, None);
                            return result;
                        }
                    }
                }
            }
        }

        if let Some(result) = best {
            // Every candidate past the escalation point failed; the held
            // low-confidence result is still a valid answer.
            self.emit_terminal(&result, started, last_failure_kind);
            return result;
        }

        let detail = last_failure.unwrap_or_else(|| "all providers skipped".to_string());
        let result = ClassificationResult::processing_error(detail);
        self.emit_terminal(&result, started, Some("exhausted"));
        result
    }

    /// Providers eligible for this request, ordered ascending by quality
    /// tier. The sort is stable, so providers sharing a tier keep their
    /// configured order and selection stays deterministic.
    fn candidates_for(&self, request: &ClassificationRequest) -> Vec<Arc<dyn ProviderInvoker>> {
        let mut candidates: Vec<Arc<dyn ProviderInvoker>> = self
            .providers
            .iter()
            .filter(|p| {
                let d = p.descriptor();
                d.tier >= request.tier_floor && (d.supports_vision || request.has_text())
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|p| p.descriptor().tier);
        candidates
    }

    fn emit_terminal(
        &self,
        result: &ClassificationResult,
        started: Instant,
        failure_kind: Option<&'static str>,
    ) {
        tracing::info!(
            provider = result.provider.as_ref().map(|p| p.as_str()).unwrap_or("none"),
            label = %result.label,
            confidence = result.confidence,
            escalated = result.escalated,
            cached = result.cached,
            latency_ms = started.elapsed().as_millis() as u64,
            failure = failure_kind.unwrap_or("none"),
            "Classification finished"
        );
    }
}

/// Index of the first candidate strictly above `current`, if any. The
/// candidate list is sorted ascending, so scanning forward also skips
/// same-tier siblings of the provider that just answered.
fn next_higher_tier(
    candidates: &[Arc<dyn ProviderInvoker>],
    from: usize,
    current: QualityTier,
) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .skip(from + 1)
        .find(|(_, p)| p.descriptor().tier > current)
        .map(|(i, _)| i)
}

/// A later valid result supersedes the held one unless it would replace a
/// named category with the `unknown` sentinel.
fn replace_best(best: &mut Option<ClassificationResult>, candidate: ClassificationResult) {
    match best {
        Some(current) if candidate.is_unknown() && !current.is_unknown() => {}
        _ => *best = Some(candidate),
    }
}
