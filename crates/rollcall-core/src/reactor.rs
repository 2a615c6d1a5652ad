//! Routes inbound events to the typed handlers.
//!
//! `dispatch` is the only place handler errors are caught: they are logged
//! with the chat context and never reach the platform update loop.

use std::sync::Arc;

use crate::{
    config::Settings,
    membership::{on_member_left, on_members_joined, JoinOutcome, LeaveOutcome},
    mention::{MentionOutcome, MentionRenderer},
    messaging::{port::MessagingPort, types::IncomingEvent},
    roster::RosterStore,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Joined(JoinOutcome),
    Left(LeaveOutcome),
    Mentioned(MentionOutcome),
    Ignored,
}

pub struct EventReactor {
    store: Arc<RosterStore>,
    messenger: Arc<dyn MessagingPort>,
    settings: Settings,
    renderer: MentionRenderer,
}

impl EventReactor {
    pub fn new(
        store: Arc<RosterStore>,
        messenger: Arc<dyn MessagingPort>,
        settings: Settings,
    ) -> Result<Self> {
        let renderer = MentionRenderer::new(&settings)?;
        Ok(Self {
            store,
            messenger,
            settings,
            renderer,
        })
    }

    pub async fn handle(&self, event: &IncomingEvent) -> Result<Outcome> {
        let messenger = self.messenger.as_ref();
        match event {
            IncomingEvent::MembersJoined(ev) => on_members_joined(&self.store, messenger, ev)
                .await
                .map(Outcome::Joined),
            IncomingEvent::MemberLeft(ev) => {
                on_member_left(&self.store, messenger, &self.settings, ev)
                    .await
                    .map(Outcome::Left)
            }
            IncomingEvent::Text(msg) => {
                if !self.renderer.is_addressed(msg) {
                    return Ok(Outcome::Ignored);
                }
                tracing::info!(chat = %msg.chat.label(), "bot addressed, mentioning members");
                self.renderer
                    .respond(&self.store, messenger, msg.chat.id)
                    .await
                    .map(Outcome::Mentioned)
            }
        }
    }

    /// Handle one event; errors are logged and swallowed.
    pub async fn dispatch(&self, event: IncomingEvent) -> Option<Outcome> {
        match self.handle(&event).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(
                    chat_id = event.chat_id().0,
                    event = event.kind(),
                    error = %e,
                    "event handler failed"
                );
                None
            }
        }
    }
}
