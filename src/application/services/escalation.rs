use crate::domain::ClassificationResult;

/// Why the orchestrator moved to a higher tier after a valid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    LowConfidence,
    UnknownLabel,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::LowConfidence => "low_confidence",
            EscalationReason::UnknownLabel => "unknown_label",
        }
    }
}

/// Decides whether a structurally valid result is good enough to accept.
/// Whether a higher tier actually exists is the orchestrator's concern;
/// this policy only judges the result itself.
#[derive(Debug, Clone, Copy)]
pub struct EscalationPolicy {
    confidence_threshold: f64,
}

impl EscalationPolicy {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// None means accept as final. A result that could not name any
    /// allowed category escalates regardless of its stated confidence.
    pub fn escalation_reason(&self, result: &ClassificationResult) -> Option<EscalationReason> {
        if result.is_unknown() {
            Some(EscalationReason::UnknownLabel)
        } else if result.confidence < self.confidence_threshold {
            Some(EscalationReason::LowConfidence)
        } else {
            None
        }
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(0.8)
    }
}
