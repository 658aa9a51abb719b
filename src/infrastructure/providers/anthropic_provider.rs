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

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages-API adapter.
#[derive(Debug)]
pub struct AnthropicProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
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
            serde_json::json!([
                { "type": "text", "text": prompt },
                {
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": "image/png",
                        "data": general_purpose::STANDARD.encode(&request.image_png)
                    }
                }
            ])
        } else {
            serde_json::json!([
                { "type": "text", "text": format!("{prompt}{}", text_only_note()) }
            ])
        };

        serde_json::json!({
            "model": self.descriptor.model,
            "max_tokens": 500,
            "temperature": 0.1,
            "messages": [{ "role": "user", "content": content }]
        })
    }
}

#[async_trait]
impl ProviderInvoker for AnthropicProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[tracing::instrument(skip(self, request), fields(provider = %self.descriptor.id))]
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(error_from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_status(status, &body));
        }

        let message: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let usage = message
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            })
            .unwrap_or_default();

        let content = message
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("message carried no content blocks".to_string())
            })?;

        parse_reply(&content, request, &self.descriptor.id, usage)
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}
