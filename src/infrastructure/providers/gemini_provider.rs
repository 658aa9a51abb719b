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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` adapter.
#[derive(Debug)]
pub struct GeminiProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
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

        let parts = if self.descriptor.supports_vision {
            serde_json::json!([
                { "text": prompt },
                {
                    "inline_data": {
                        "mime_type": "image/png",
                        "data": general_purpose::STANDARD.encode(&request.image_png)
                    }
                }
            ])
        } else {
            serde_json::json!([{ "text": format!("{prompt}{}", text_only_note()) }])
        };

        serde_json::json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "temperature": 0.1,
                "maxOutputTokens": 500
            }
        })
    }
}

#[async_trait]
impl ProviderInvoker for GeminiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[tracing::instrument(skip(self, request), fields(provider = %self.descriptor.id))]
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.descriptor.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(error_from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_status(status, &body));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let usage = generated
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let content = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("response carried no candidates".to_string())
            })?;

        parse_reply(&content, request, &self.descriptor.id, usage)
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}
