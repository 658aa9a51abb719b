use serde::{Deserialize, Serialize};

use super::ProviderId;

/// Label substituted when no provider produced a confident match, or when a
/// provider answered with a label outside the allowed set.
pub const LABEL_UNKNOWN: &str = "unknown";

/// Label carried by the terminal result when every candidate provider failed
/// or was skipped.
pub const LABEL_PROCESSING_ERROR: &str = "processing_error";

/// Token accounting reported by a provider for one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Final or intermediate outcome of one classification attempt.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub label: String,
    /// Always within [0.0, 1.0].
    pub confidence: f64,
    pub rationale: Option<String>,
    /// Provider that produced the result. None only for the
    /// `processing_error` sentinel.
    pub provider: Option<ProviderId>,
    pub escalated: bool,
    pub cached: bool,
    pub usage: TokenUsage,
    pub estimated_cost: f64,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f64, provider: ProviderId) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            rationale: None,
            provider: Some(provider),
            escalated: false,
            cached: false,
            usage: TokenUsage::default(),
            estimated_cost: 0.0,
        }
    }

    /// Terminal sentinel for an exhausted fallback sequence. Never cached.
    pub fn processing_error(detail: impl Into<String>) -> Self {
        Self {
            label: LABEL_PROCESSING_ERROR.to_string(),
            confidence: 0.0,
            rationale: Some(detail.into()),
            provider: None,
            escalated: false,
            cached: false,
            usage: TokenUsage::default(),
            estimated_cost: 0.0,
        }
    }

    pub fn is_processing_error(&self) -> bool {
        self.label == LABEL_PROCESSING_ERROR
    }

    pub fn is_unknown(&self) -> bool {
        self.label == LABEL_UNKNOWN
    }
}
