use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;

use crate::application::ports::{ProviderError, ProviderInvoker};
use crate::domain::{ClassificationRequest, ClassificationResult, ProviderDescriptor, TokenUsage};
use crate::infrastructure::providers::prompt::{build_prompt, text_only_note};
use crate::infrastructure::providers::response::{
    error_from_status, error_from_transport, parse_reply,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions adapter. Sends the rendered page image as an inline
/// data URL when the configured model supports vision.
#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(descriptor: ProviderDescriptor, api_key: String) -> Self {
        Self::with_base_url(descriptor, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        descriptor: ProviderDescriptor,
        api_key: String,
        base_url: &str,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            descriptor,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request_body(&self, request: &ClassificationRequest) -> serde_json::Value {
        let prompt = build_prompt(request);

        let content = if self.descriptor.supports_vision {
            let image_b64 = general_purpose::STANDARD.encode(&request.image_png);
            serde_json::json!([
                { "type": "text", "text": prompt },
                {
                    "type": "image_url",
                    "image_url": { "url": format!("data:image/png;base64,{image_b64}") }
                }
            ])
        } else {
            serde_json::Value::String(format!("{prompt}{}", text_only_note()))
        };

        serde_json::json!({
            "model": self.descriptor.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": 500,
            "temperature": 0.1
        })
    }
}

#[async_trait]
impl ProviderInvoker for OpenAiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[tracing::instrument(skip(self, request), fields(provider = %self.descriptor.id))]
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(error_from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_status(status, &body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let usage = completion
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("completion carried no choices".to_string())
            })?;

        parse_reply(&content, request, &self.descriptor.id, usage)
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
