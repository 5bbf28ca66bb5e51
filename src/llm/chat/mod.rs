pub mod openrouter;

use async_trait::async_trait;
use serde_json::{ json, Value };
use std::sync::Arc;
use thiserror::Error;

use super::LlmConfig;
use self::openrouter::OpenRouterClient;

/// Failure body returned by the upstream service, parsed best-effort.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamErrorBody {
    Structured(Value),
    Opaque(String),
}

impl UpstreamErrorBody {
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => UpstreamErrorBody::Structured(value),
            Err(_) => UpstreamErrorBody::Opaque(text.to_string()),
        }
    }

    /// Object placed under `details` in the relay's error envelope.
    pub fn to_details(&self) -> Value {
        match self {
            UpstreamErrorBody::Structured(value) => value.clone(),
            UpstreamErrorBody::Opaque(text) => json!({ "error": text }),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream returned status {status}")]
    Status {
        status: u16,
        body: UpstreamErrorBody,
    },
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API request failed: invalid response body: {0}")]
    Decode(String),
    #[error("invalid upstream configuration: {0}")]
    Config(String),
}

impl UpstreamError {
    pub fn details(&self) -> Value {
        match self {
            UpstreamError::Status { body, .. } => body.to_details(),
            other => json!({ "message": other.to_string() }),
        }
    }
}

/// A completions service the relay forwards conversations to.
#[async_trait]
pub trait ChatUpstream: Send + Sync {
    /// Sends the message array as-is and returns the upstream JSON body.
    async fn complete(&self, messages: Vec<Value>) -> Result<Value, UpstreamError>;

    fn model(&self) -> &str;
}

/// Builds the upstream client, or `None` when no credential is configured.
pub fn new_client(
    config: &LlmConfig
) -> Result<Option<Arc<dyn ChatUpstream>>, UpstreamError> {
    match config.credential() {
        Some(_) => {
            let client: Arc<dyn ChatUpstream> = Arc::new(OpenRouterClient::from_config(config)?);
            Ok(Some(client))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body_is_structured() {
        let body = UpstreamErrorBody::parse(r#"{"error":{"message":"quota","code":429}}"#);
        assert_eq!(
            body,
            UpstreamErrorBody::Structured(json!({ "error": { "message": "quota", "code": 429 } }))
        );
        assert_eq!(body.to_details()["error"]["code"], 429);
    }

    #[test]
    fn plain_text_error_body_is_opaque() {
        let body = UpstreamErrorBody::parse("Bad Gateway");
        assert_eq!(body, UpstreamErrorBody::Opaque("Bad Gateway".into()));
        assert_eq!(body.to_details(), json!({ "error": "Bad Gateway" }));
    }

    #[test]
    fn non_status_errors_report_a_message() {
        let err = UpstreamError::Decode("expected value".into());
        assert_eq!(
            err.details(),
            json!({ "message": "API request failed: invalid response body: expected value" })
        );
    }

    #[test]
    fn no_credential_means_no_client() {
        let client = new_client(&LlmConfig::default()).unwrap();
        assert!(client.is_none());
    }
}
