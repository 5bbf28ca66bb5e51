pub mod clipboard;
pub mod display;
pub mod export;
pub mod relay;
pub mod repl;
pub mod reveal;
pub mod scroll;
pub mod speech;

use chrono::Local;
use log::{ error, info, warn };
use std::fs;
use std::io;
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use thiserror::Error;

use crate::history::{ self, DurableStorage, StoreError };
use crate::models::chat::{ ChatMessage, Conversation, WireMessage };
use self::clipboard::{ Clipboard, ClipboardShadow, NoClipboard };
use self::display::Display;
use self::relay::{ RelayClient, RelayClientError };
use self::reveal::{ Reveal, RevealRegistry, RevealStep, RevealTiming };
use self::scroll::{ ScrollAction, ScrollTracker, Viewport };
use self::speech::{ NoSpeaker, Speaker, SpeechError };

pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";
pub const FALLBACK_REPLY: &str = "I'm sorry, I encountered an error. Please try again later.";
pub const EMPTY_REPLY: &str = "Sorry, I couldn't generate a response.";
pub const CLEAR_CONFIRMATION: &str =
    "Are you sure you want to start a new chat? This will clear your current conversation.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("display error: {0}")]
    Io(#[from] io::Error),
}

/// State of one chat session: the conversation plus everything the UI
/// toggles around it.
pub struct ChatSession {
    conversation: Conversation,
    storage: Arc<dyn DurableStorage>,
    display: Arc<dyn Display>,
    clipboard: Arc<dyn Clipboard>,
    speaker: Arc<dyn Speaker>,
    scroll: ScrollTracker,
    clipboard_shadow: ClipboardShadow,
    dark_mode: bool,
    typing_effect: bool,
    timing: RevealTiming,
    reveals: RevealRegistry,
}

impl ChatSession {
    pub fn new(storage: Arc<dyn DurableStorage>, display: Arc<dyn Display>) -> Self {
        Self {
            conversation: Conversation::new(),
            storage,
            display,
            clipboard: Arc::new(NoClipboard),
            speaker: Arc::new(NoSpeaker),
            scroll: ScrollTracker::default(),
            clipboard_shadow: ClipboardShadow::default(),
            dark_mode: false,
            typing_effect: true,
            timing: RevealTiming::default(),
            reveals: RevealRegistry::default(),
        }
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_speaker(mut self, speaker: Arc<dyn Speaker>) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn with_timing(mut self, timing: RevealTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Whether relay replies are typed out or shown at once.
    pub fn with_typing_effect(mut self, enabled: bool) -> Self {
        self.typing_effect = enabled;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn scrolled_away(&self) -> bool {
        self.scroll.scrolled_away()
    }

    pub fn clipboard_shadow(&self) -> &ClipboardShadow {
        &self.clipboard_shadow
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Handle for stopping this session's reveals while a `send` or
    /// `append_assistant_message` call holds the session.
    pub fn reveal_canceller(&self) -> RevealRegistry {
        self.reveals.clone()
    }

    /// Loads preferences and history, greeting the user when there is none.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.dark_mode = history::load_dark_mode(self.storage.as_ref())?;
        self.display.set_dark_mode(self.dark_mode);
        self.display.set_clear_clipboard_enabled(false);

        self.restore()?;
        if self.conversation.is_empty() {
            self.show_greeting().await?;
        }
        Ok(())
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        history::save_conversation(self.storage.as_ref(), &self.conversation)
    }

    /// Replaces the in-memory conversation with the stored one and redraws it.
    pub fn restore(&mut self) -> Result<usize, SessionError> {
        self.conversation = history::load_conversation(self.storage.as_ref())?;
        for msg in self.conversation.iter() {
            self.display.render_message(msg)?;
        }
        if !self.conversation.is_empty() {
            self.jump_to_latest();
        }
        info!("Restored {} message(s)", self.conversation.len());
        Ok(self.conversation.len())
    }

    /// Records a user turn and returns the payload for the relay, or `None`
    /// when the input is blank.
    pub fn append_user_message(&mut self, text: &str) -> Result<Option<Vec<WireMessage>>, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let message = ChatMessage::user(text);
        self.conversation.push(message.clone());
        self.persist()?;
        self.display.render_message(&message)?;
        self.follow_new_content();

        Ok(Some(self.conversation.to_wire()))
    }

    /// Records the assistant turn for a finished relay call. Failures become
    /// the fallback reply and blank replies become `EMPTY_REPLY`; both are
    /// stored like any other.
    pub async fn complete_request(
        &mut self,
        outcome: Result<String, RelayClientError>
    ) -> Result<(), SessionError> {
        self.display.set_waiting(false);
        match outcome {
            Ok(reply) if reply.trim().is_empty() => {
                warn!("Relay returned an empty reply");
                let typing = self.typing_effect;
                self.append_assistant_message(EMPTY_REPLY, typing).await
            }
            Ok(reply) => {
                let typing = self.typing_effect;
                self.append_assistant_message(reply.trim(), typing).await
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                self.append_assistant_message(FALLBACK_REPLY, false).await
            }
        }
    }

    /// Full send cycle. Returns `false` without contacting the relay when the
    /// input is blank.
    pub async fn send(&mut self, text: &str, relay: &dyn RelayClient) -> Result<bool, SessionError> {
        let Some(payload) = self.append_user_message(text)? else {
            return Ok(false);
        };
        self.display.set_waiting(true);
        let outcome = relay.complete(payload).await;
        self.complete_request(outcome).await?;
        Ok(true)
    }

    /// Stores the reply before any of it is drawn.
    pub async fn append_assistant_message(
        &mut self,
        text: &str,
        with_typing_effect: bool
    ) -> Result<(), SessionError> {
        let message = ChatMessage::assistant(text);
        self.conversation.push(message.clone());
        self.persist()?;
        self.present(&message, with_typing_effect).await?;
        self.follow_new_content();
        Ok(())
    }

    async fn present(&self, message: &ChatMessage, with_typing_effect: bool) -> io::Result<()> {
        if !with_typing_effect {
            return self.display.render_message(message);
        }

        let mut reveal = Reveal::new(&message.content);
        let handle = reveal.cancel_handle();
        let _registered = self.reveals.register(handle.clone());
        let result = self.reveal(message, &mut reveal).await;

        if let Err(e) = result {
            warn!("Progressive reveal failed, rendering in full: {}", e);
            return self.display.render_message(message);
        }
        if handle.is_cancelled() {
            info!("Reveal stopped early; the full reply is stored");
        }
        Ok(())
    }

    async fn reveal(&self, message: &ChatMessage, reveal: &mut Reveal) -> io::Result<()> {
        self.display.begin_reveal(message)?;
        loop {
            match reveal.step() {
                RevealStep::Char(c) => {
                    self.display.reveal_char(c)?;
                    pause(self.timing.char_delay()).await;
                }
                RevealStep::LineBreak => {
                    self.display.reveal_line_break()?;
                    pause(self.timing.line_pause).await;
                }
                RevealStep::Finished => break,
            }
        }
        self.display.end_reveal(message)
    }

    async fn show_greeting(&mut self) -> io::Result<()> {
        let greeting = ChatMessage::assistant(GREETING);
        let typing = self.typing_effect;
        self.present(&greeting, typing).await
    }

    /// Starts over. Asks first when there is more than one message; returns
    /// whether anything was cleared.
    pub async fn clear(&mut self) -> Result<bool, SessionError> {
        if self.conversation.len() > 1 && !self.display.confirm(CLEAR_CONFIRMATION) {
            return Ok(false);
        }

        self.conversation.clear();
        history::remove_conversation(self.storage.as_ref())?;
        self.display.clear()?;
        self.scroll.jump_to_latest();
        self.show_greeting().await?;
        info!("Conversation cleared");
        Ok(true)
    }

    /// Writes a transcript into `dir` and returns its path, or `None` when
    /// there is nothing to export.
    pub fn export(&self, dir: &Path) -> Result<Option<PathBuf>, SessionError> {
        if self.conversation.is_empty() {
            self.display.notify("No chat to export");
            return Ok(None);
        }

        let today = Local::now().date_naive();
        let path = dir.join(export::export_file_name(today));
        fs::write(&path, export::transcript(&self.conversation, today))?;
        info!("Exported {} message(s) to {}", self.conversation.len(), path.display());
        self.display.notify("Chat exported successfully!");
        Ok(Some(path))
    }

    /// Copies message `index` (0-based). Returns `false` when there is no such
    /// message or the clipboard refused.
    pub fn copy(&mut self, index: usize) -> bool {
        match self.conversation.get(index).map(|m| m.content.clone()) {
            Some(content) => self.copy_text(&content),
            None => false,
        }
    }

    pub fn copy_text(&mut self, text: &str) -> bool {
        self.clipboard_shadow.record(text);
        match self.clipboard.write_text(text) {
            Ok(()) => {
                self.display.notify("Copied to clipboard!");
                self.display.set_clear_clipboard_enabled(true);
                true
            }
            Err(e) => {
                warn!("Copy failed: {}", e);
                self.display.notify("Failed to copy. Please try again.");
                false
            }
        }
    }

    pub fn clear_clipboard(&mut self) {
        if let Err(e) = self.clipboard.write_text("") {
            warn!("Clearing clipboard failed: {}", e);
        }
        self.clipboard_shadow.clear();
        self.display.set_clear_clipboard_enabled(false);
        self.display.notify("Clipboard cleared");
    }

    /// Reads message `index` (0-based) aloud.
    pub fn read_aloud(&self, index: usize) -> Result<bool, SpeechError> {
        match self.conversation.get(index) {
            Some(msg) => self.speak(&msg.content).map(|_| true),
            None => Ok(false),
        }
    }

    /// Speaks `text` chunk by chunk; each chunk starts after the previous one ends.
    pub fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let chunks = speech::utterances(text);
        self.display.notify("Speaking...");
        for chunk in &chunks {
            if let Err(e) = self.speaker.speak(chunk) {
                if matches!(e, SpeechError::Unavailable) {
                    self.display.notify("Speech synthesis is not supported here");
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<bool, SessionError> {
        self.dark_mode = !self.dark_mode;
        history::save_dark_mode(self.storage.as_ref(), self.dark_mode)?;
        self.display.set_dark_mode(self.dark_mode);
        Ok(self.dark_mode)
    }

    /// Feeds a scroll event from the display surface.
    pub fn on_scroll(&mut self, viewport: Viewport) {
        self.scroll.on_scroll(viewport);
        if !self.scroll.scrolled_away() {
            self.display.set_new_message_indicator(false);
        }
    }

    /// Jumps to the newest message, as when the indicator is clicked.
    pub fn jump_to_latest(&mut self) {
        self.scroll.jump_to_latest();
        self.display.scroll_to_latest();
        self.display.set_new_message_indicator(false);
    }

    fn follow_new_content(&mut self) {
        match self.scroll.on_new_content(self.display.viewport()) {
            ScrollAction::ScrollToLatest => {
                self.display.scroll_to_latest();
                self.display.set_new_message_indicator(false);
            }
            ScrollAction::ShowIndicator => self.display.set_new_message_indicator(true),
        }
    }
}

async fn pause(duration: std::time::Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
