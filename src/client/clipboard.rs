use std::io::{ self, Write };
use std::process::{ Command, ExitStatus, Stdio };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard is available")]
    Unavailable,
    #[error("clipboard command failed: {0}")]
    Io(#[from] io::Error),
    #[error("clipboard command exited with {0}")]
    Status(ExitStatus),
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Pipes text into an external program such as `pbcopy` or `xclip -selection clipboard`.
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self { program, args: parts.collect() })
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .spawn()?;
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };
        // The child is reaped even when it stopped reading early.
        let status = child.wait()?;
        written?;
        if status.success() { Ok(()) } else { Err(ClipboardError::Status(status)) }
    }
}

pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

/// Last copied text. Only decides whether "clear clipboard" is offered.
#[derive(Debug, Clone, Default)]
pub struct ClipboardShadow {
    content: String,
}

impl ClipboardShadow {
    pub fn record(&mut self, text: &str) {
        self.content = text.to_string();
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn can_clear(&self) -> bool {
        !self.content.is_empty()
    }
}
