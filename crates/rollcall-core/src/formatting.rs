//! Telegram MarkdownV2 helpers for mention messages.

use crate::domain::Member;

/// Characters Telegram MarkdownV2 reserves outside of code entities.
const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape text for Telegram MarkdownV2 parse mode.
///
/// Every reserved character, and the backslash itself, is prefixed with `\`.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if c == '\\' || MARKDOWN_V2_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Deep link that opens (and, in a message, mentions) a user by id.
pub fn user_link(user_id: i64) -> String {
    format!("tg://user?id={user_id}")
}

/// `[name](tg://user?id=N)` with the name escaped; blank names fall back to the id.
pub fn mention_link(member: &Member) -> String {
    let name = member.name.trim();
    let label = if name.is_empty() {
        member.id.to_string()
    } else {
        name.to_string()
    };
    format!("[{}]({})", escape_markdown_v2(&label), user_link(member.id))
}
