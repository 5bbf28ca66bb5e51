use std::io::{ self, BufRead, Write };
use std::sync::atomic::{ AtomicBool, Ordering };

use super::scroll::Viewport;
use crate::models::chat::{ ChatMessage, Role };

/// The surface messages are drawn on.
///
/// A progressive reveal is drawn as `begin_reveal`, any number of
/// `reveal_char` / `reveal_line_break` calls, then `end_reveal`. Anything
/// else is drawn whole through `render_message`.
pub trait Display: Send + Sync {
    fn render_message(&self, message: &ChatMessage) -> io::Result<()>;

    fn begin_reveal(&self, message: &ChatMessage) -> io::Result<()>;

    fn reveal_char(&self, c: char) -> io::Result<()>;

    fn reveal_line_break(&self) -> io::Result<()>;

    fn end_reveal(&self, message: &ChatMessage) -> io::Result<()>;

    fn clear(&self) -> io::Result<()>;

    /// Short-lived notice (copy confirmation, export result, ...).
    fn notify(&self, text: &str);

    fn confirm(&self, question: &str) -> bool;

    fn viewport(&self) -> Viewport {
        Viewport::at_bottom()
    }

    fn scroll_to_latest(&self) {}

    fn set_new_message_indicator(&self, _visible: bool) {}

    fn set_clear_clipboard_enabled(&self, _enabled: bool) {}

    fn set_dark_mode(&self, _dark: bool) {}

    /// Shown while a relay call is outstanding.
    fn set_waiting(&self, _waiting: bool) {}
}

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const ERASE_LINE: &str = "\r\x1b[2K";

/// ANSI terminal rendering on stdout, confirmations read from stdin.
#[derive(Default)]
pub struct TerminalDisplay {
    dark: AtomicBool,
    waiting: AtomicBool,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn role_color(&self, role: Role) -> &'static str {
        let dark = self.dark.load(Ordering::Relaxed);
        match (role, dark) {
            (Role::User, false) => "\x1b[34m",
            (Role::User, true) => "\x1b[96m",
            (Role::Assistant, false) => "\x1b[32m",
            (Role::Assistant, true) => "\x1b[92m",
        }
    }

    fn write_header(&self, out: &mut impl Write, message: &ChatMessage) -> io::Result<()> {
        writeln!(
            out,
            "{}{}{} {}{}{}",
            self.role_color(message.role),
            message.role.display_name(),
            RESET,
            DIM,
            message.timestamp,
            RESET
        )
    }
}

impl Display for TerminalDisplay {
    fn render_message(&self, message: &ChatMessage) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.write_header(&mut out, message)?;
        writeln!(out, "{}\n", message.content)?;
        out.flush()
    }

    fn begin_reveal(&self, message: &ChatMessage) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.write_header(&mut out, message)?;
        out.flush()
    }

    fn reveal_char(&self, c: char) -> io::Result<()> {
        let mut out = io::stdout().lock();
        write!(out, "{}", c)?;
        out.flush()
    }

    fn reveal_line_break(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        out.flush()
    }

    fn end_reveal(&self, _message: &ChatMessage) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "\n")?;
        out.flush()
    }

    fn clear(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        write!(out, "\x1b[2J\x1b[H")?;
        out.flush()
    }

    fn notify(&self, text: &str) {
        eprintln!("{}» {}{}", DIM, text, RESET);
    }

    fn confirm(&self, question: &str) -> bool {
        eprint!("{} [y/N] ", question);
        let _ = io::stderr().flush();
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn set_dark_mode(&self, dark: bool) {
        self.dark.store(dark, Ordering::Relaxed);
    }

    fn set_waiting(&self, waiting: bool) {
        if self.waiting.swap(waiting, Ordering::Relaxed) == waiting {
            return;
        }
        let mut out = io::stdout().lock();
        let drawn = if waiting {
            write!(out, "{}AI is typing…{}", DIM, RESET)
        } else {
            write!(out, "{}", ERASE_LINE)
        };
        if drawn.and_then(|_| out.flush()).is_err() {
            log::debug!("Could not draw the waiting line");
        }
    }
}
