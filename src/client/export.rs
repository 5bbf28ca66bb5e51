use chrono::NaiveDate;

use crate::models::chat::Conversation;

pub const EXPORT_TITLE: &str = "# AI Chat Export";

/// `10/17/2026` style, matching how the page shows dates.
pub fn format_export_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("chat_export_{}.txt", format_export_date(date).replace('/', "-"))
}

/// Plain-text transcript of a conversation as of `date`.
pub fn transcript(conversation: &Conversation, date: NaiveDate) -> String {
    let mut text = format!("{}\n# Date: {}\n\n", EXPORT_TITLE, format_export_date(date));
    for msg in conversation.iter() {
        text.push_str(&format!("{} ({}):\n{}\n\n", msg.role.display_name(), msg.timestamp, msg.content));
    }
    text
}
