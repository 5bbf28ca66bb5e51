use async_trait::async_trait;
use log::{ debug, error };
use reqwest::Client as HttpClient;
use thiserror::Error;
use url::Url;

use crate::models::api::{ ChatRequest, CompletionEnvelope, ErrorBody };
use crate::models::chat::WireMessage;

pub const CHAT_ROUTE: &str = "/api/chat";

#[derive(Debug, Error)]
pub enum RelayClientError {
    #[error("relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay answered {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
    },
    #[error("Invalid response format from API")]
    InvalidResponse,
}

/// Where the chat client sends the conversation to get a reply.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn complete(&self, messages: Vec<WireMessage>) -> Result<String, RelayClientError>;
}

pub struct HttpRelayClient {
    http: HttpClient,
    endpoint: Url,
}

impl HttpRelayClient {
    pub fn new(relay_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http: HttpClient::new(),
            endpoint: relay_url.join(CHAT_ROUTE)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn complete(&self, messages: Vec<WireMessage>) -> Result<String, RelayClientError> {
        debug!("Sending {} message(s) to {}", messages.len(), self.endpoint);
        let resp = self.http
            .post(self.endpoint.clone())
            .json(&ChatRequest { messages })
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>().await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Failed to get response".to_string());
            error!("Relay rejected request with {}: {}", status, message);
            return Err(RelayClientError::Rejected { status: status.as_u16(), message });
        }

        let envelope = resp
            .json::<CompletionEnvelope>().await
            .map_err(|_| RelayClientError::InvalidResponse)?;
        envelope
            .first_content()
            .map(|content| content.trim().to_string())
            .ok_or(RelayClientError::InvalidResponse)
    }
}
