//! Join/leave handling: keep the roster current and clean up service notices.
//!
//! The roster change is always persisted before the notice is deleted, so a
//! crash between the two never loses a membership update.

use crate::{
    config::Settings,
    domain::MessageRef,
    messaging::{
        port::MessagingPort,
        types::{ChatInfo, MemberLeft, MembersJoined},
    },
    roster::RosterStore,
    Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Entries added or renamed.
    pub updated: usize,
    pub skipped_bots: usize,
    pub notice_deleted: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub removed: bool,
    pub skipped_bot: bool,
    pub notice_deleted: bool,
}

pub async fn on_members_joined(
    store: &RosterStore,
    messenger: &dyn MessagingPort,
    event: &MembersJoined,
) -> Result<JoinOutcome> {
    let chat_id = event.chat.id;
    let humans: Vec<_> = event.members.iter().filter(|m| !m.is_bot).collect();
    let skipped_bots = event.members.len() - humans.len();

    let saved = store
        .mutate(|roster| {
            humans
                .iter()
                .filter(|m| roster.add_member(chat_id, m.id, &m.display_name))
                .count()
        })
        .await;

    for m in &humans {
        tracing::info!(
            chat = %event.chat.label(),
            user_id = m.id.0,
            name = %m.display_name,
            "member joined"
        );
    }

    let notice_deleted = delete_notice(messenger, &event.chat, event.notice, "join").await;

    let updated = saved?;
    Ok(JoinOutcome {
        updated,
        skipped_bots,
        notice_deleted,
    })
}

pub async fn on_member_left(
    store: &RosterStore,
    messenger: &dyn MessagingPort,
    settings: &Settings,
    event: &MemberLeft,
) -> Result<LeaveOutcome> {
    let member = &event.member;
    let skipped_bot = member.is_bot;

    let saved = if skipped_bot {
        Ok(0)
    } else {
        let chat_id = event.chat.id;
        store
            .mutate(|roster| usize::from(roster.remove_member(chat_id, member.id)))
            .await
    };

    tracing::info!(
        chat = %event.chat.label(),
        user_id = member.id.0,
        name = %member.display_name,
        bot = skipped_bot,
        "member left"
    );

    let notice_deleted = if settings.delete_leave_messages {
        delete_notice(messenger, &event.chat, event.notice, "leave").await
    } else {
        false
    };

    let removed = saved? > 0;
    Ok(LeaveOutcome {
        removed,
        skipped_bot,
        notice_deleted,
    })
}

/// Best-effort: missing rights or an already-deleted notice only log a warning.
async fn delete_notice(
    messenger: &dyn MessagingPort,
    chat: &ChatInfo,
    notice: MessageRef,
    kind: &str,
) -> bool {
    match messenger.delete_message(notice).await {
        Ok(()) => {
            tracing::info!(chat = %chat.label(), kind, "deleted service notice");
            true
        }
        Err(e) => {
            tracing::warn!(
                chat = %chat.label(),
                kind,
                message_id = notice.message_id.0,
                error = %e,
                "failed to delete service notice"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, Member, MessageId, UserId};
    use crate::messaging::types::Identity;
    use crate::roster::InMemoryRoster;
    use crate::testing::FakeMessenger;
    use std::sync::Arc;

    const CHAT: ChatId = ChatId(-1001);

    /// Records whether the persisted roster held a given member at the moment
    /// each delete was issued.
    struct PersistedAtDelete {
        mem: Arc<InMemoryRoster>,
        watch: UserId,
        seen: std::sync::Mutex<Vec<bool>>,
    }

    impl PersistedAtDelete {
        fn new(mem: Arc<InMemoryRoster>, watch: UserId) -> Self {
            Self {
                mem,
                watch,
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<bool> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl MessagingPort for PersistedAtDelete {
        async fn send_text(&self, chat_id: ChatId, _text: &str) -> Result<MessageRef> {
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }

        async fn send_markdown(&self, chat_id: ChatId, _markdown: &str) -> Result<MessageRef> {
            self.send_text(chat_id, "").await
        }

        async fn delete_message(&self, msg: MessageRef) -> Result<()> {
            let persisted = self
                .mem
                .snapshot()
                .is_some_and(|r| r.contains(msg.chat_id, self.watch));
            self.seen.lock().unwrap().push(persisted);
            Ok(())
        }
    }

    fn notice(id: i32) -> MessageRef {
        MessageRef {
            chat_id: CHAT,
            message_id: MessageId(id),
        }
    }

    fn joined(members: Vec<Identity>) -> MembersJoined {
        MembersJoined {
            chat: ChatInfo::with_title(CHAT, "Test group"),
            notice: notice(10),
            members,
        }
    }

    fn left(member: Identity) -> MemberLeft {
        MemberLeft {
            chat: ChatInfo::new(CHAT),
            notice: notice(11),
            member,
        }
    }

    #[tokio::test]
    async fn join_tracks_humans_and_deletes_notice() {
        let mem = Arc::new(InMemoryRoster::new());
        let store = RosterStore::open(mem.clone());
        let messenger = FakeMessenger::default();

        let out = on_members_joined(
            &store,
            &messenger,
            &joined(vec![
                Identity::user(1, "Ann"),
                Identity::bot(99, "Spam Bot"),
                Identity::user(2, "Bo"),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(out.updated, 2);
        assert_eq!(out.skipped_bots, 1);
        assert!(out.notice_deleted);
        assert_eq!(
            store.members(CHAT).await,
            vec![Member::new(UserId(1), "Ann"), Member::new(UserId(2), "Bo")]
        );
        assert_eq!(mem.save_count(), 1);
        assert_eq!(messenger.deleted(), vec![notice(10)]);
    }

    #[tokio::test]
    async fn join_is_persisted_before_notice_is_deleted() {
        let mem = Arc::new(InMemoryRoster::new());
        let store = RosterStore::open(mem.clone());
        let messenger = PersistedAtDelete::new(mem.clone(), UserId(1));

        on_members_joined(&store, &messenger, &joined(vec![Identity::user(1, "Ann")]))
            .await
            .unwrap();

        assert_eq!(messenger.seen(), vec![true]);
    }

    #[tokio::test]
    async fn leave_is_persisted_before_notice_is_deleted() {
        let mut saved = crate::roster::Roster::new();
        saved.add_member(CHAT, UserId(1), "Ann");
        saved.add_member(CHAT, UserId(2), "Bo");
        let mem = Arc::new(InMemoryRoster::with_roster(saved));
        let store = RosterStore::open(mem.clone());
        let messenger = PersistedAtDelete::new(mem.clone(), UserId(1));
        let settings = Settings {
            delete_leave_messages: true,
            ..Settings::default()
        };

        let out = on_member_left(&store, &messenger, &settings, &left(Identity::user(1, "Ann")))
            .await
            .unwrap();

        assert!(out.removed);
        assert_eq!(messenger.seen(), vec![false]);
    }

    #[tokio::test]
    async fn delete_failure_does_not_undo_roster_update() {
        let mem = Arc::new(InMemoryRoster::new());
        let store = RosterStore::open(mem.clone());
        let messenger = FakeMessenger::failing_deletes();

        let out = on_members_joined(&store, &messenger, &joined(vec![Identity::user(1, "Ann")]))
            .await
            .unwrap();

        assert!(!out.notice_deleted);
        assert!(mem.snapshot().unwrap().contains(CHAT, UserId(1)));
    }

    #[tokio::test]
    async fn save_failure_still_deletes_notice_then_errors() {
        let store = RosterStore::open(Arc::new(InMemoryRoster::failing()));
        let messenger = FakeMessenger::default();

        let res =
            on_members_joined(&store, &messenger, &joined(vec![Identity::user(1, "Ann")])).await;

        assert!(res.is_err());
        assert_eq!(messenger.deleted().len(), 1);
    }

    #[tokio::test]
    async fn only_bots_joined_skips_save_but_deletes_notice() {
        let mem = Arc::new(InMemoryRoster::new());
        let store = RosterStore::open(mem.clone());
        let messenger = FakeMessenger::default();

        let out = on_members_joined(&store, &messenger, &joined(vec![Identity::bot(5, "B")]))
            .await
            .unwrap();

        assert_eq!(out.updated, 0);
        assert_eq!(mem.save_count(), 0);
        assert!(out.notice_deleted);
        assert!(store.members(CHAT).await.is_empty());
    }

    #[tokio::test]
    async fn leave_removes_member_and_keeps_notice_by_default() {
        let store = RosterStore::in_memory();
        store.add_member(CHAT, UserId(1), "Ann").await;
        store.add_member(CHAT, UserId(2), "Bo").await;
        let messenger = FakeMessenger::default();

        let out = on_member_left(
            &store,
            &messenger,
            &Settings::default(),
            &left(Identity::user(1, "Ann")),
        )
        .await
        .unwrap();

        assert!(out.removed);
        assert!(!out.notice_deleted);
        assert!(messenger.deleted().is_empty());
        assert_eq!(store.members(CHAT).await, vec![Member::new(UserId(2), "Bo")]);
    }

    #[tokio::test]
    async fn leave_notice_deleted_when_enabled() {
        let store = RosterStore::in_memory();
        let messenger = FakeMessenger::default();
        let settings = Settings {
            delete_leave_messages: true,
            ..Settings::default()
        };

        let out = on_member_left(&store, &messenger, &settings, &left(Identity::user(3, "Cy")))
            .await
            .unwrap();

        assert!(!out.removed);
        assert!(out.notice_deleted);
        assert_eq!(messenger.deleted(), vec![notice(11)]);
    }

    #[tokio::test]
    async fn bot_leaving_is_not_touched() {
        let mem = Arc::new(InMemoryRoster::new());
        let store = RosterStore::open(mem.clone());
        let messenger = FakeMessenger::default();

        let out = on_member_left(
            &store,
            &messenger,
            &Settings::default(),
            &left(Identity::bot(99, "Helper")),
        )
        .await
        .unwrap();

        assert!(out.skipped_bot);
        assert!(!out.removed);
        assert_eq!(mem.save_count(), 0);
    }
}
