use serde::{ Serialize, Deserialize };
use serde_json::Value;

use super::chat::WireMessage;

/// Body sent by the chat client to `POST /api/chat`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(error: impl Into<String>, details: Value) -> Self {
        Self { error: error.into(), details: Some(details) }
    }
}

/// The subset of the upstream completion envelope the client reads.
#[derive(Deserialize, Debug, Clone)]
pub struct CompletionEnvelope {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionChoice {
    pub message: Option<CompletionMessage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: String,
}

impl CompletionEnvelope {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .map(|message| message.content.as_str())
    }
}
