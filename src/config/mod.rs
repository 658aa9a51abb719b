mod settings;

pub use settings::{OrchestratorSettings, ProviderKindSetting, ProviderSettings, Settings};
