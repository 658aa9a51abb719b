use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable health record for a single provider. The transition rules live
/// here; serialization of concurrent access is the registry's job.
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    opened_at: Option<Instant>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl ProviderHealth {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            opened_at: None,
            failure_threshold,
            cooldown,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_failure_at(&self) -> Option<Instant> {
        self.last_failure_at
    }

    /// Whether a call may be attempted right now. An OPEN circuit whose
    /// cooldown has elapsed admits exactly one HALF_OPEN probe; further
    /// callers are rejected until the probe outcome is recorded.
    pub fn may_attempt(&mut self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let opened = match self.opened_at {
                    Some(t) => t,
                    None => return false,
                };
                if now.duration_since(opened) >= self.cooldown {
                    self.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.last_failure_at = Some(now);
        match self.state {
            CircuitState::HalfOpen => {
                // Failed probe: re-open and restart the cooldown.
                self.state = CircuitState::Open;
                self.opened_at = Some(now);
            }
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_threshold {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(now);
                }
            }
            CircuitState::Open => {
                self.consecutive_failures += 1;
            }
        }
    }

    /// Operator-triggered reset to a clean CLOSED state.
    pub fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.last_failure_at = None;
        self.opened_at = None;
    }
}
