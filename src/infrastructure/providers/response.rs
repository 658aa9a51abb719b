use reqwest::StatusCode;
use serde::Deserialize;

use crate::application::ports::ProviderError;
use crate::domain::{
    ClassificationRequest, ClassificationResult, ProviderId, TokenUsage, LABEL_UNKNOWN,
};

#[derive(Deserialize)]
struct ProviderReply {
    classification: Option<String>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Two-stage parse of a provider's free-text reply: strip known code-fence
/// wrappers, then decode the remainder as JSON. Stage-two failure is
/// `MalformedResponse`. An out-of-set label is substituted with the
/// reserved `unknown` label; confidence is clamped into [0, 1] and
/// defaults to 0.0 when absent or unparsable.
pub fn parse_reply(
    content: &str,
    request: &ClassificationRequest,
    provider: &ProviderId,
    usage: TokenUsage,
) -> Result<ClassificationResult, ProviderError> {
    let payload = strip_fences(content);

    let reply: ProviderReply = serde_json::from_str(payload)
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON payload: {e}")))?;

    let label = match reply.classification {
        Some(label) if request.allows_label(&label) => label,
        Some(label) => {
            tracing::warn!(
                provider = %provider,
                label = %label,
                "Provider answered with a label outside the allowed set"
            );
            LABEL_UNKNOWN.to_string()
        }
        None => LABEL_UNKNOWN.to_string(),
    };

    let confidence = reply
        .confidence
        .as_ref()
        .and_then(parse_confidence)
        .unwrap_or(0.0);

    let mut result = ClassificationResult::new(label, confidence, provider.clone());
    result.rationale = reply.reasoning.filter(|r| !r.trim().is_empty());
    result.usage = usage;
    Ok(result)
}

/// Providers routinely wrap the JSON answer in markdown fences despite
/// being told not to. Unwrap the first fenced block if one is present.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    for delimiter in ["```json", "```"] {
        if let Some((_, rest)) = trimmed.split_once(delimiter) {
            if let Some((inner, _)) = rest.split_once("```") {
                return inner.trim();
            }
        }
    }
    trimmed
}

fn parse_confidence(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Maps a non-success HTTP status to the failure taxonomy.
pub fn error_from_status(status: StatusCode, body: &str) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Auth(format!("{status}: {body}"))
        }
        _ => ProviderError::Transport(format!("{status}: {body}")),
    }
}

/// Maps a reqwest failure to the failure taxonomy.
pub fn error_from_transport(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(error.to_string())
    }
}
