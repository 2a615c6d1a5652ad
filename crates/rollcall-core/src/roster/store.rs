use std::sync::Arc;

use tokio::sync::Mutex;

use super::{Roster, RosterPersistence};
use crate::{
    domain::{ChatId, Member, UserId},
    Result,
};

/// The process-wide roster, injected into the event reactor.
///
/// One global lock guards every load-modify-save, so concurrent handlers for
/// different chats never lose each other's updates.
pub struct RosterStore {
    persistence: Arc<dyn RosterPersistence>,
    roster: Mutex<Roster>,
}

impl RosterStore {
    /// Load persisted state. Never fails: a missing file starts empty, an
    /// unreadable or corrupt one is logged and also starts empty.
    pub fn open(persistence: Arc<dyn RosterPersistence>) -> Self {
        let roster = match persistence.load() {
            Ok(Some(roster)) => {
                let roster = roster.normalize();
                tracing::info!(
                    source = %persistence.describe(),
                    chats = roster.chat_count(),
                    members = roster.total_members(),
                    "roster loaded"
                );
                roster
            }
            Ok(None) => {
                tracing::info!(
                    source = %persistence.describe(),
                    "no saved roster, starting empty"
                );
                Roster::new()
            }
            Err(e) => {
                tracing::warn!(
                    source = %persistence.describe(),
                    error = %e,
                    "failed to load roster, starting empty"
                );
                Roster::new()
            }
        };

        Self {
            persistence,
            roster: Mutex::new(roster),
        }
    }

    /// Store with nothing persisted behind it (tests, dry runs).
    pub fn in_memory() -> Self {
        Self::open(Arc::new(super::InMemoryRoster::new()))
    }

    /// Serialize the full roster through the persistence port.
    pub async fn save(&self) -> Result<()> {
        let roster = self.roster.lock().await;
        self.persistence.save(&roster)
    }

    /// Insert or rename a member in memory. Call `save` (or use `mutate`) to persist.
    pub async fn add_member(&self, chat_id: ChatId, member_id: UserId, name: &str) -> bool {
        self.roster
            .lock()
            .await
            .add_member(chat_id, member_id, name)
    }

    /// Remove a member in memory; absent members are a no-op.
    pub async fn remove_member(&self, chat_id: ChatId, member_id: UserId) -> bool {
        self.roster.lock().await.remove_member(chat_id, member_id)
    }

    pub async fn members(&self, chat_id: ChatId) -> Vec<Member> {
        self.roster.lock().await.members(chat_id)
    }

    pub async fn member_count(&self, chat_id: ChatId) -> usize {
        self.roster.lock().await.member_count(chat_id)
    }

    pub async fn snapshot(&self) -> Roster {
        self.roster.lock().await.clone()
    }

    /// Apply a batch of changes and persist once, under the store lock.
    ///
    /// `f` returns how many entries it changed; nothing is written when that
    /// is zero. On a save error the in-memory change is kept and the error is
    /// returned for the caller to log.
    pub async fn mutate<F>(&self, f: F) -> Result<usize>
    where
        F: FnOnce(&mut Roster) -> usize,
    {
        let mut roster = self.roster.lock().await;
        let changed = f(&mut *roster);
        if changed > 0 {
            self.persistence.save(&roster)?;
        }
        Ok(changed)
    }
}
