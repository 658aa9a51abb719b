use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::{CircuitState, ProviderDescriptor, ProviderHealth, ProviderId};

/// Snapshot of one provider's circuit for the diagnostics surface.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub provider: ProviderId,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub seconds_since_last_failure: Option<u64>,
}

/// Process-wide registry of per-provider circuit breakers. One guarded
/// entry per configured provider; callers only see the atomic
/// may_attempt / record_success / record_failure operations, never the
/// raw health fields. Checks take a lock but never suspend.
pub struct HealthRegistry {
    entries: HashMap<ProviderId, Mutex<ProviderHealth>>,
}

impl HealthRegistry {
    pub fn new(
        descriptors: &[ProviderDescriptor],
        failure_threshold: u32,
        cooldown: Duration,
    ) -> Self {
        let entries = descriptors
            .iter()
            .map(|d| {
                (
                    d.id.clone(),
                    Mutex::new(ProviderHealth::new(failure_threshold, cooldown)),
                )
            })
            .collect();
        Self { entries }
    }

    /// Whether the breaker admits a call right now. Flips OPEN to
    /// HALF_OPEN when the cooldown has elapsed, admitting a single probe.
    /// Unknown providers are rejected.
    pub fn may_attempt(&self, provider: &ProviderId) -> bool {
        match self.entries.get(provider) {
            Some(entry) => entry.lock().expect("health lock").may_attempt(Instant::now()),
            None => false,
        }
    }

    pub fn record_success(&self, provider: &ProviderId) {
        if let Some(entry) = self.entries.get(provider) {
            entry.lock().expect("health lock").record_success();
        }
    }

    pub fn record_failure(&self, provider: &ProviderId) {
        if let Some(entry) = self.entries.get(provider) {
            let mut health = entry.lock().expect("health lock");
            health.record_failure(Instant::now());
            if health.state() == CircuitState::Open {
                tracing::warn!(
                    provider = %provider,
                    consecutive_failures = health.consecutive_failures(),
                    "Circuit open for provider"
                );
            }
        }
    }

    /// Operator-triggered reset of one provider's circuit.
    pub fn reset(&self, provider: &ProviderId) {
        if let Some(entry) = self.entries.get(provider) {
            entry.lock().expect("health lock").reset();
        }
    }

    pub fn snapshot(&self) -> Vec<HealthSnapshot> {
        let now = Instant::now();
        let mut snapshots: Vec<HealthSnapshot> = self
            .entries
            .iter()
            .map(|(id, entry)| {
                let health = entry.lock().expect("health lock");
                HealthSnapshot {
                    provider: id.clone(),
                    state: health.state(),
                    consecutive_failures: health.consecutive_failures(),
                    seconds_since_last_failure: health
                        .last_failure_at()
                        .map(|t| now.duration_since(t).as_secs()),
                }
            })
            .collect();
        snapshots.sort_by(|a, b| a.provider.as_str().cmp(b.provider.as_str()));
        snapshots
    }
}
