use std::fmt;

/// Configured identity of a classification provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered quality rank. Higher rank means higher expected accuracy
/// (and usually higher cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualityTier(u8);

impl QualityTier {
    pub fn new(rank: u8) -> Self {
        Self(rank)
    }

    pub fn rank(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of supported provider wire protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

/// Static per-provider metadata. Owned by configuration, read-only to the
/// orchestration core.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub kind: ProviderKind,
    pub model: String,
    pub cost_per_call: f64,
    pub rate_limit_rpm: u32,
    pub tier: QualityTier,
    pub supports_vision: bool,
}
