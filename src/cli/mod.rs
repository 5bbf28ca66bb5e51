use clap::{ Parser, Subcommand };
use std::path::PathBuf;
use url::Url;

use crate::llm::{ self, LlmConfig };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the completion relay and serve the page shell.
    Serve(ServeArgs),
    /// Chat with the relay from the terminal.
    Chat(ChatArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    // --- Server Args ---
    /// Interface the HTTP server binds to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value = "3002")]
    pub port: u16,

    /// Directory holding the page shell (index.html) and its assets.
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    // --- Upstream Args ---
    /// Credential injected into upstream requests. Without it the relay answers 500.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upstream chat completions endpoint.
    #[arg(long, env = "UPSTREAM_URL", default_value = llm::DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    /// Model requested from the upstream service.
    #[arg(long, env = "UPSTREAM_MODEL", default_value = llm::DEFAULT_MODEL)]
    pub model: String,

    /// Maximum output tokens requested per completion.
    #[arg(long, env = "UPSTREAM_MAX_TOKENS", default_value_t = llm::DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Sampling temperature requested per completion.
    #[arg(long, env = "UPSTREAM_TEMPERATURE", default_value_t = llm::DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Value sent in the HTTP-Referer header upstream.
    #[arg(long, env = "UPSTREAM_REFERER", default_value = "http://localhost:3000")]
    pub referer: String,

    /// Value sent in the X-Title header upstream.
    #[arg(long, env = "UPSTREAM_TITLE", default_value = "AI Chatbot")]
    pub title: String,

    // --- TLS Args ---
    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}

impl ServeArgs {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.api_key.clone(),
            base_url: self.upstream_url.clone(),
            completion_model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            referer: self.referer.clone(),
            title: self.title.clone(),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ChatArgs {
    /// Base URL of the relay server.
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:3002")]
    pub relay_url: Url,

    /// Directory for the saved conversation and preferences. Defaults to the user data dir.
    #[arg(long, env = "CHAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory exported transcripts are written to.
    #[arg(long, env = "EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Print replies at once instead of typing them out.
    #[arg(long, env = "NO_TYPING", default_value = "false")]
    pub no_typing: bool,

    /// Command that receives copied text on stdin (e.g. "xclip -selection clipboard").
    #[arg(long, env = "CLIPBOARD_COMMAND")]
    pub clipboard_command: Option<String>,

    /// Command that reads text aloud, given the text as its last argument (e.g. "espeak").
    #[arg(long, env = "SPEECH_COMMAND")]
    pub speech_command: Option<String>,
}

impl ChatArgs {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chat-relay")
        })
    }
}
