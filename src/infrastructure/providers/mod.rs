mod anthropic_provider;
mod gemini_provider;
mod openai_provider;
mod prompt;
mod provider_factory;
mod response;
mod scripted_provider;

pub use anthropic_provider::AnthropicProvider;
pub use gemini_provider::GeminiProvider;
pub use openai_provider::OpenAiProvider;
pub use prompt::build_prompt;
pub use provider_factory::{ProviderFactory, ProviderFactoryError};
pub use response::parse_reply;
pub use scripted_provider::ScriptedProvider;
