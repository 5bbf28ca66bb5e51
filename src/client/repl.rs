use log::{ info, warn };
use std::error::Error;
use std::future::Future;
use std::io::{ self, BufRead, Write };
use std::sync::Arc;

use super::clipboard::{ Clipboard, CommandClipboard, NoClipboard };
use super::display::{ Display, TerminalDisplay };
use super::relay::HttpRelayClient;
use super::reveal::RevealRegistry;
use super::speech::{ CommandSpeaker, NoSpeaker, Speaker };
use super::{ ChatSession, SessionError };
use crate::cli::ChatArgs;
use crate::history::initialize_storage;

const HELP: &str = "\
Commands:
  /copy [n]    copy message n (default: last) to the clipboard
  /clearclip   clear the clipboard
  /speak [n]   read message n (default: last) aloud
  /export      write the conversation to a text file
  /theme       toggle dark mode
  /clear       start a new chat
  /help        show this help
  /quit        leave
Anything else is sent to the assistant. Ctrl-C while a reply is being typed
shows no more of it; the whole reply is still saved.";

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Message(String),
    Copy(Option<usize>),
    ClearClipboard,
    Speak(Option<usize>),
    Export,
    Theme,
    Clear,
    Help,
    Quit,
    Unknown(String),
}

/// Interprets one line typed at the prompt. Message numbers are 1-based.
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let number = parts.next().and_then(|n| n.parse::<usize>().ok());

    match name.as_str() {
        "copy" => Input::Copy(number),
        "clearclip" => Input::ClearClipboard,
        "speak" => Input::Speak(number),
        "export" => Input::Export,
        "theme" => Input::Theme,
        "clear" | "new" => Input::Clear,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(trimmed.to_string()),
    }
}

/// Resolves a 1-based message number, defaulting to the newest message.
fn message_index(number: Option<usize>, len: usize) -> Option<usize> {
    match number {
        Some(n) if n >= 1 && n <= len => Some(n - 1),
        Some(_) => None,
        None => len.checked_sub(1),
    }
}

/// Drives `action` to completion, stopping running reveals on every Ctrl-C.
async fn with_interrupts<T>(
    action: impl Future<Output = T>,
    reveals: &RevealRegistry,
    display: &dyn Display
) -> T {
    tokio::pin!(action);
    loop {
        tokio::select! {
            result = &mut action => {
                return result;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Cannot listen for Ctrl-C: {}", e);
                    return action.await;
                }
                if reveals.cancel_all() > 0 {
                    display.notify("Stopped typing. The full reply is saved.");
                }
            }
        }
    }
}

/// Keeps the session alive after a failed action; only the action is lost.
fn report(display: &dyn Display, action: &str, result: Result<(), SessionError>) {
    if let Err(e) = result {
        warn!("{} failed: {}", action, e);
        display.notify(&format!("{} failed: {}", action, e));
    }
}

async fn read_line() -> io::Result<Option<String>> {
    tokio::task
        ::spawn_blocking(|| {
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line)? {
                0 => Ok(None),
                _ => Ok(Some(line)),
            }
        }).await
        .map_err(io::Error::other)?
}

pub async fn run_chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let storage = initialize_storage(args.resolved_data_dir())?;
    let display: Arc<dyn Display> = Arc::new(TerminalDisplay::new());
    let clipboard: Arc<dyn Clipboard> = match args.clipboard_command.as_deref().and_then(CommandClipboard::parse) {
        Some(c) => Arc::new(c),
        None => Arc::new(NoClipboard),
    };
    let speaker: Arc<dyn Speaker> = match args.speech_command.as_deref().and_then(CommandSpeaker::parse) {
        Some(s) => Arc::new(s),
        None => Arc::new(NoSpeaker),
    };
    let relay = HttpRelayClient::new(&args.relay_url)?;
    info!("Relay endpoint: {}", relay.endpoint());

    let mut session = ChatSession::new(storage, display.clone())
        .with_clipboard(clipboard)
        .with_speaker(speaker)
        .with_typing_effect(!args.no_typing);
    session.start().await?;
    let reveals = session.reveal_canceller();

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = read_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Message(text) => {
                let sent = with_interrupts(session.send(&text, &relay), &reveals, display.as_ref()).await;
                report(display.as_ref(), "Send", sent.map(|_| ()));
            }
            Input::Copy(number) => {
                match message_index(number, session.conversation().len()) {
                    Some(index) => {
                        session.copy(index);
                    }
                    None => display.notify("No such message"),
                }
            }
            Input::ClearClipboard => session.clear_clipboard(),
            Input::Speak(number) => {
                match message_index(number, session.conversation().len()) {
                    Some(index) => {
                        if let Err(e) = session.read_aloud(index) {
                            warn!("Read aloud failed: {}", e);
                        }
                    }
                    None => display.notify("No such message"),
                }
            }
            Input::Export => {
                report(display.as_ref(), "Export", session.export(&args.export_dir).map(|_| ()));
            }
            Input::Theme => {
                match session.toggle_theme() {
                    Ok(dark) => display.notify(if dark { "Dark mode on" } else { "Dark mode off" }),
                    Err(e) => report(display.as_ref(), "Theme change", Err(e)),
                }
            }
            Input::Clear => {
                let cleared = with_interrupts(session.clear(), &reveals, display.as_ref()).await;
                report(display.as_ref(), "Clear", cleared.map(|_| ()));
            }
            Input::Help => display.notify(HELP),
            Input::Quit => break,
            Input::Unknown(command) => display.notify(&format!("Unknown command {}. Try /help", command)),
        }
    }

    Ok(())
}
