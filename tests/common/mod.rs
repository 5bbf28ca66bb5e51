//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chat_relay::client::clipboard::{ Clipboard, ClipboardError };
use chat_relay::client::display::Display;
use chat_relay::client::relay::{ RelayClient, RelayClientError };
use chat_relay::client::scroll::Viewport;
use chat_relay::client::speech::{ Speaker, SpeechError };
use chat_relay::history::{ load_conversation, DurableStorage };
use chat_relay::llm::chat::{ ChatUpstream, UpstreamError };
use chat_relay::models::chat::{ ChatMessage, WireMessage };
use serde_json::Value;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };

/// Serves `app` on an ephemeral local port.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Upstream stand-in that counts calls and answers with a canned result.
pub struct StubUpstream {
    pub calls: AtomicUsize,
    pub received: Mutex<Vec<Vec<Value>>>,
    respond: Box<dyn Fn() -> Result<Value, UpstreamError> + Send + Sync>,
}

impl StubUpstream {
    pub fn new(respond: impl Fn() -> Result<Value, UpstreamError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatUpstream for StubUpstream {
    async fn complete(&self, messages: Vec<Value>) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(messages);
        (self.respond)()
    }

    fn model(&self) -> &str {
        "stub/model"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Rendered(ChatMessage),
    Revealed(ChatMessage, String),
    Cleared,
    Notice(String),
    Indicator(bool),
    ScrolledToLatest,
    ClearClipboardEnabled(bool),
    DarkMode(bool),
    Waiting(bool),
}

/// Display that records everything drawn on it.
pub struct RecordingDisplay {
    pub events: Mutex<Vec<Event>>,
    revealing: Mutex<Option<(ChatMessage, String)>>,
    confirm_answer: AtomicBool,
    pub confirm_asked: AtomicUsize,
    fail_reveal: AtomicBool,
    viewport: Mutex<Viewport>,
    storage: Option<Arc<dyn DurableStorage>>,
    /// Stored conversation length seen when each reveal began.
    pub stored_len_at_reveal: Mutex<Vec<usize>>,
}

impl RecordingDisplay {
    pub fn new() -> Arc<Self> {
        Self::build(None)
    }

    pub fn watching(storage: Arc<dyn DurableStorage>) -> Arc<Self> {
        Self::build(Some(storage))
    }

    fn build(storage: Option<Arc<dyn DurableStorage>>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            revealing: Mutex::new(None),
            confirm_answer: AtomicBool::new(true),
            confirm_asked: AtomicUsize::new(0),
            fail_reveal: AtomicBool::new(false),
            viewport: Mutex::new(Viewport::at_bottom()),
            storage,
            stored_len_at_reveal: Mutex::new(Vec::new()),
        })
    }

    pub fn answer_confirm(&self, answer: bool) {
        self.confirm_answer.store(answer, Ordering::SeqCst);
    }

    pub fn fail_reveals(&self) {
        self.fail_reveal.store(true, Ordering::SeqCst);
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        *self.viewport.lock().unwrap() = viewport;
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Messages fully drawn, whether at once or revealed.
    pub fn shown(&self) -> Vec<ChatMessage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Rendered(m) | Event::Revealed(m, _) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Display for RecordingDisplay {
    fn render_message(&self, message: &ChatMessage) -> io::Result<()> {
        self.push(Event::Rendered(message.clone()));
        Ok(())
    }

    fn begin_reveal(&self, message: &ChatMessage) -> io::Result<()> {
        if let Some(storage) = &self.storage {
            let stored = load_conversation(storage.as_ref()).unwrap();
            self.stored_len_at_reveal.lock().unwrap().push(stored.len());
        }
        *self.revealing.lock().unwrap() = Some((message.clone(), String::new()));
        Ok(())
    }

    fn reveal_char(&self, c: char) -> io::Result<()> {
        if self.fail_reveal.load(Ordering::SeqCst) {
            return Err(io::Error::other("surface detached"));
        }
        if let Some((_, text)) = self.revealing.lock().unwrap().as_mut() {
            text.push(c);
        }
        Ok(())
    }

    fn reveal_line_break(&self) -> io::Result<()> {
        if let Some((_, text)) = self.revealing.lock().unwrap().as_mut() {
            text.push('\n');
        }
        Ok(())
    }

    fn end_reveal(&self, _message: &ChatMessage) -> io::Result<()> {
        if let Some((message, text)) = self.revealing.lock().unwrap().take() {
            self.push(Event::Revealed(message, text));
        }
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.push(Event::Cleared);
        Ok(())
    }

    fn notify(&self, text: &str) {
        self.push(Event::Notice(text.to_string()));
    }

    fn confirm(&self, _question: &str) -> bool {
        self.confirm_asked.fetch_add(1, Ordering::SeqCst);
        self.confirm_answer.load(Ordering::SeqCst)
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap()
    }

    fn scroll_to_latest(&self) {
        self.push(Event::ScrolledToLatest);
    }

    fn set_new_message_indicator(&self, visible: bool) {
        self.push(Event::Indicator(visible));
    }

    fn set_clear_clipboard_enabled(&self, enabled: bool) {
        self.push(Event::ClearClipboardEnabled(enabled));
    }

    fn set_dark_mode(&self, dark: bool) {
        self.push(Event::DarkMode(dark));
    }

    fn set_waiting(&self, waiting: bool) {
        self.push(Event::Waiting(waiting));
    }
}

/// Relay stand-in. Records each payload and the stored conversation length
/// at the moment it was called.
pub struct StubRelay {
    reply: Result<String, String>,
    storage: Arc<dyn DurableStorage>,
    pub payloads: Mutex<Vec<Vec<WireMessage>>>,
    pub stored_len_at_call: Mutex<Vec<usize>>,
}

impl StubRelay {
    pub fn replying(reply: &str, storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            storage,
            payloads: Mutex::new(Vec::new()),
            stored_len_at_call: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str, storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            reply: Err(message.to_string()),
            storage,
            payloads: Mutex::new(Vec::new()),
            stored_len_at_call: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl RelayClient for StubRelay {
    async fn complete(&self, messages: Vec<WireMessage>) -> Result<String, RelayClientError> {
        let stored = load_conversation(self.storage.as_ref()).unwrap();
        self.stored_len_at_call.lock().unwrap().push(stored.len());
        self.payloads.lock().unwrap().push(messages);
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(message) => Err(RelayClientError::Rejected { status: 500, message: message.clone() }),
        }
    }
}

#[derive(Default)]
pub struct MemoryClipboard {
    pub writes: Mutex<Vec<String>>,
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    pub spoken: Mutex<Vec<String>>,
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, utterance: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(utterance.to_string());
        Ok(())
    }
}
