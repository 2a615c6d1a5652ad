use teloxide::types::{Message, User};

use rollcall_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{
        ChatInfo, Identity, IncomingEvent, MemberLeft, MembersJoined, TextMessage,
    },
};

/// Translate a Telegram message into a core event.
///
/// Service messages take precedence over text; everything else (photos,
/// stickers, other service messages) yields `None`.
pub fn to_event(msg: &Message) -> Option<IncomingEvent> {
    let chat = chat_info(msg);
    let notice = message_ref(msg);

    if let Some(users) = msg.new_chat_members() {
        return Some(IncomingEvent::MembersJoined(MembersJoined {
            chat,
            notice,
            members: users.iter().map(identity).collect(),
        }));
    }

    if let Some(user) = msg.left_chat_member() {
        return Some(IncomingEvent::MemberLeft(MemberLeft {
            chat,
            notice,
            member: identity(user),
        }));
    }

    let text = msg.text()?;
    Some(IncomingEvent::Text(TextMessage {
        chat,
        message: notice,
        sender: sender(msg),
        text: text.to_string(),
    }))
}

/// Anonymous group admins post as the chat itself, with `from` set to the
/// `GroupAnonymousBot` account. They are people, so no bot identity is kept.
fn sender(msg: &Message) -> Option<Identity> {
    if msg
        .sender_chat()
        .is_some_and(|c| c.id == msg.chat.id)
    {
        return None;
    }
    msg.from().map(identity)
}

fn chat_info(msg: &Message) -> ChatInfo {
    ChatInfo {
        id: ChatId(msg.chat.id.0),
        title: msg.chat.title().map(str::to_string),
    }
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}

fn identity(user: &User) -> Identity {
    Identity {
        id: UserId(user.id.0 as i64),
        is_bot: user.is_bot,
        display_name: display_name(user),
    }
}

/// Full name, falling back to the @username when Telegram gives a blank name.
fn display_name(user: &User) -> String {
    let full = user.full_name();
    if !full.trim().is_empty() {
        return full;
    }
    user.username.clone().unwrap_or_default()
}
