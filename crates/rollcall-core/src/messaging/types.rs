use crate::domain::{ChatId, MessageRef, UserId};

/// Inbound event model, translated from platform updates by the adapter.
#[derive(Clone, Debug)]
pub enum IncomingEvent {
    MembersJoined(MembersJoined),
    MemberLeft(MemberLeft),
    Text(TextMessage),
}

impl IncomingEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::MembersJoined(e) => e.chat.id,
            Self::MemberLeft(e) => e.chat.id,
            Self::Text(e) => e.chat.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MembersJoined(_) => "members_joined",
            Self::MemberLeft(_) => "member_left",
            Self::Text(_) => "text",
        }
    }
}

/// The chat an event happened in; the title is only used for logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub title: Option<String>,
}

impl ChatInfo {
    pub fn new(id: ChatId) -> Self {
        Self { id, title: None }
    }

    pub fn with_title(id: ChatId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
        }
    }

    pub fn label(&self) -> String {
        match &self.title {
            Some(t) => format!("{t} ({})", self.id.0),
            None => self.id.0.to_string(),
        }
    }
}

/// A user as seen in an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub is_bot: bool,
    pub display_name: String,
}

impl Identity {
    pub fn user(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            is_bot: false,
            display_name: display_name.into(),
        }
    }

    pub fn bot(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            is_bot: true,
            display_name: display_name.into(),
        }
    }
}

/// "X joined the group" service message (one or more members).
#[derive(Clone, Debug)]
pub struct MembersJoined {
    pub chat: ChatInfo,
    pub notice: MessageRef,
    pub members: Vec<Identity>,
}

/// "X left the group" service message.
#[derive(Clone, Debug)]
pub struct MemberLeft {
    pub chat: ChatInfo,
    pub notice: MessageRef,
    pub member: Identity,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat: ChatInfo,
    pub message: MessageRef,
    pub sender: Option<Identity>,
    pub text: String,
}
