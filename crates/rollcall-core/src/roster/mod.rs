//! Per-chat member roster.
//!
//! `Roster` is plain data (what gets persisted), `RosterPersistence` is the
//! storage port, and `RosterStore` is the injected service the handlers use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ChatId, Member, UserId};

mod persistence;
mod store;

pub use persistence::{atomic_write, InMemoryRoster, JsonFileRoster, RosterPersistence};
pub use store::RosterStore;

/// Mapping chat id → (member id → member).
///
/// Serialized as `{"chats": {"<chat>": {"<member>": {"id": .., "name": ..}}}}`.
/// A chat whose last member leaves is removed, never kept as an empty object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    chats: BTreeMap<i64, BTreeMap<i64, Member>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or rename a member. Returns `true` if the roster changed.
    pub fn add_member(&mut self, chat_id: ChatId, member_id: UserId, name: &str) -> bool {
        let chat = self.chats.entry(chat_id.0).or_default();
        match chat.get_mut(&member_id.0) {
            Some(existing) if existing.name == name => false,
            Some(existing) => {
                existing.name = name.to_string();
                true
            }
            None => {
                chat.insert(member_id.0, Member::new(member_id, name));
                true
            }
        }
    }

    /// Remove a member. Absent members are a no-op. Returns `true` if the roster changed.
    pub fn remove_member(&mut self, chat_id: ChatId, member_id: UserId) -> bool {
        let Some(chat) = self.chats.get_mut(&chat_id.0) else {
            return false;
        };
        let removed = chat.remove(&member_id.0).is_some();
        if chat.is_empty() {
            self.chats.remove(&chat_id.0);
        }
        removed
    }

    /// Members of a chat in ascending id order; empty for an unknown chat.
    pub fn members(&self, chat_id: ChatId) -> Vec<Member> {
        self.chats
            .get(&chat_id.0)
            .map(|chat| chat.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, chat_id: ChatId, member_id: UserId) -> bool {
        self.chats
            .get(&chat_id.0)
            .is_some_and(|chat| chat.contains_key(&member_id.0))
    }

    pub fn member_count(&self, chat_id: ChatId) -> usize {
        self.chats.get(&chat_id.0).map_or(0, BTreeMap::len)
    }

    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }

    pub fn total_members(&self) -> usize {
        self.chats.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// Repair data written by hand or by older builds: drop empty chats and
    /// make each entry's `id` agree with its key.
    pub(crate) fn normalize(mut self) -> Self {
        self.chats.retain(|_, members| !members.is_empty());
        for members in self.chats.values_mut() {
            for (id, member) in members.iter_mut() {
                member.id = *id;
            }
        }
        self
    }
}
