use async_trait::async_trait;
use log::{ debug, error, info };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::Serialize;
use serde_json::Value;

use super::{ ChatUpstream, UpstreamError, UpstreamErrorBody };
use crate::llm::{ mask_api_key, LlmConfig };

pub struct OpenRouterClient {
    http: HttpClient,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Value>,
    max_tokens: u32,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| UpstreamError::Config(format!("Invalid API key format: {}", e)))?
        );
        headers.insert(
            "http-referer",
            HeaderValue::from_str(&config.referer)
                .map_err(|e| UpstreamError::Config(format!("Invalid referer: {}", e)))?
        );
        headers.insert(
            "x-title",
            HeaderValue::from_str(&config.title)
                .map_err(|e| UpstreamError::Config(format!("Invalid title: {}", e)))?
        );

        let http = HttpClient::builder().default_headers(headers).build()?;
        info!("Upstream client ready for {} using API key {}", config.base_url, mask_api_key(api_key));

        Ok(Self {
            http,
            url: config.base_url.clone(),
            model: config.completion_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, UpstreamError> {
        let api_key = config
            .credential()
            .ok_or_else(|| UpstreamError::Config("API key is required".to_string()))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl ChatUpstream for OpenRouterClient {
    async fn complete(&self, messages: Vec<Value>) -> Result<Value, UpstreamError> {
        let req = CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = self.http.post(&self.url).json(&req).send().await?;
        let status = resp.status();
        info!("Upstream response status: {}", status);

        if !status.is_success() {
            let text = resp.text().await?;
            error!("Upstream error response: {}", text);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: UpstreamErrorBody::parse(&text),
            });
        }

        let bytes = resp.bytes().await?;
        let body = serde_json
            ::from_slice::<Value>(&bytes)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        debug!("Successful response from upstream");
        Ok(body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
