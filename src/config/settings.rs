use std::time::Duration;

use serde::Deserialize;

use crate::domain::{ProviderDescriptor, ProviderId, ProviderKind, QualityTier};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub providers: Vec<ProviderSettings>,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

impl Settings {
    /// A sensible default lineup: a cheap vision model first, two
    /// same-tier backups from other vendors, and one high-accuracy
    /// escalation target.
    pub fn default_lineup() -> Self {
        Self {
            providers: vec![
                ProviderSettings {
                    name: "openai-gpt4o-mini".to_string(),
                    kind: ProviderKindSetting::OpenAi,
                    model: "gpt-4o-mini".to_string(),
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    cost_per_call: 0.003,
                    rate_limit_rpm: 500,
                    tier: 1,
                    supports_vision: true,
                },
                ProviderSettings {
                    name: "google-gemini-flash".to_string(),
                    kind: ProviderKindSetting::Gemini,
                    model: "gemini-1.5-flash".to_string(),
                    api_key_env: "GOOGLE_API_KEY".to_string(),
                    cost_per_call: 0.002,
                    rate_limit_rpm: 300,
                    tier: 1,
                    supports_vision: true,
                },
                ProviderSettings {
                    name: "anthropic-claude-haiku".to_string(),
                    kind: ProviderKindSetting::Anthropic,
                    model: "claude-3-haiku-20240307".to_string(),
                    api_key_env: "ANTHROPIC_API_KEY".to_string(),
                    cost_per_call: 0.004,
                    rate_limit_rpm: 300,
                    tier: 1,
                    supports_vision: true,
                },
                ProviderSettings {
                    name: "openai-gpt4o".to_string(),
                    kind: ProviderKindSetting::OpenAi,
                    model: "gpt-4o".to_string(),
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    cost_per_call: 0.03,
                    rate_limit_rpm: 200,
                    tier: 2,
                    supports_vision: true,
                },
            ],
            orchestrator: OrchestratorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub kind: ProviderKindSetting,
    pub model: String,
    /// Name of the environment variable holding this provider's API key.
    pub api_key_env: String,
    pub cost_per_call: f64,
    pub rate_limit_rpm: u32,
    pub tier: u8,
    pub supports_vision: bool,
}

impl ProviderSettings {
    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: ProviderId::new(self.name.clone()),
            kind: self.kind.into(),
            model: self.model.clone(),
            cost_per_call: self.cost_per_call,
            rate_limit_rpm: self.rate_limit_rpm,
            tier: QualityTier::new(self.tier),
            supports_vision: self.supports_vision,
        }
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKindSetting {
    OpenAi,
    Gemini,
    Anthropic,
}

impl From<ProviderKindSetting> for ProviderKind {
    fn from(kind: ProviderKindSetting) -> Self {
        match kind {
            ProviderKindSetting::OpenAi => ProviderKind::OpenAi,
            ProviderKindSetting::Gemini => ProviderKind::Gemini,
            ProviderKindSetting::Anthropic => ProviderKind::Anthropic,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSettings {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl OrchestratorSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            workers: default_workers(),
            queue_depth: default_queue_depth(),
        }
    }
}

fn default_confidence_threshold() -> f64 {
    0.8
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_attempt_timeout_secs() -> u64 {
    60
}

fn default_workers() -> usize {
    4
}

fn default_queue_depth() -> usize {
    64
}
