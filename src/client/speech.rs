use log::debug;
use regex::Regex;
use std::io;
use std::process::{ Command, ExitStatus };
use std::sync::OnceLock;
use thiserror::Error;

/// Texts longer than this many characters are spoken sentence by sentence.
pub const CHUNK_THRESHOLD: usize = 200;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis is not available")]
    Unavailable,
    #[error("speech command failed: {0}")]
    Io(#[from] io::Error),
    #[error("speech command exited with {0}")]
    Status(ExitStatus),
}

pub trait Speaker: Send + Sync {
    /// Speaks one utterance and returns once it has finished.
    fn speak(&self, utterance: &str) -> Result<(), SpeechError>;
}

fn sentence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence pattern"))
}

/// Splits text into the utterances handed to the speaker, in order.
pub fn utterances(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.chars().count() <= CHUNK_THRESHOLD {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut consumed = 0;
    for sentence in sentence_pattern().find_iter(text) {
        chunks.push(sentence.as_str().to_string());
        consumed = sentence.end();
    }
    let tail = text[consumed..].trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }
    chunks
}

/// Runs an external program (e.g. `espeak`) with the utterance as last argument.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self { program, args: parts.collect() })
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, utterance: &str) -> Result<(), SpeechError> {
        debug!("Speaking {} characters via {}", utterance.len(), self.program);
        let status = Command::new(&self.program).args(&self.args).arg(utterance).status()?;
        if status.success() { Ok(()) } else { Err(SpeechError::Status(status)) }
    }
}

pub struct NoSpeaker;

impl Speaker for NoSpeaker {
    fn speak(&self, _utterance: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }
}
