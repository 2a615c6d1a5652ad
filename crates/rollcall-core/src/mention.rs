//! "Call everyone": when the bot is addressed, mention every tracked member.

use regex::Regex;

use crate::{
    config::Settings,
    domain::{ChatId, Member},
    errors::Error,
    formatting::mention_link,
    messaging::{port::MessagingPort, types::TextMessage},
    roster::RosterStore,
    Result,
};

/// Whole-token, case-sensitive `@username` detector.
///
/// `@roll_bot` matches in `"hi @roll_bot!"` but not in `"@roll_bot2"` or
/// `"me@roll_bot"`.
#[derive(Clone, Debug)]
pub struct MentionTrigger {
    pattern: Option<Regex>,
}

impl MentionTrigger {
    pub fn new(username: &str) -> Result<Self> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Ok(Self { pattern: None });
        }
        let re = format!(
            r"(?:^|[^A-Za-z0-9_])@{}(?:$|[^A-Za-z0-9_])",
            regex::escape(username)
        );
        let pattern =
            Regex::new(&re).map_err(|e| Error::Config(format!("invalid bot username: {e}")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(text))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MentionOutcome {
    pub batches: usize,
    pub failed: usize,
    pub members: usize,
}

/// Split members into MarkdownV2 messages of at most `batch_size` mentions each.
///
/// Order follows `members`; every member appears exactly once.
pub fn render_batches(members: &[Member], batch_size: usize) -> Vec<String> {
    members
        .chunks(batch_size.max(1))
        .map(|batch| {
            batch
                .iter()
                .map(mention_link)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

pub struct MentionRenderer {
    trigger: MentionTrigger,
    batch_size: usize,
    no_members_message: String,
}

impl MentionRenderer {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            trigger: MentionTrigger::new(&settings.bot_username)?,
            batch_size: settings.mention_batch_size.max(1),
            no_members_message: settings.no_members_message.clone(),
        })
    }

    /// Messages from bots never trigger, even when they contain the handle.
    /// Anonymous admins arrive without a sender (see the Telegram adapter), so
    /// they still can.
    pub fn is_addressed(&self, msg: &TextMessage) -> bool {
        if msg.sender.as_ref().is_some_and(|s| s.is_bot) {
            return false;
        }
        self.trigger.matches(&msg.text)
    }

    /// Send the mention batches for a chat.
    ///
    /// Each batch is sent on its own; a failed batch gets a plain-text apology
    /// and the rest still go out.
    pub async fn respond(
        &self,
        store: &RosterStore,
        messenger: &dyn MessagingPort,
        chat_id: ChatId,
    ) -> Result<MentionOutcome> {
        let members = store.members(chat_id).await;
        if members.is_empty() {
            messenger
                .send_text(chat_id, &self.no_members_message)
                .await?;
            return Ok(MentionOutcome::default());
        }

        let batches = render_batches(&members, self.batch_size);
        let total = batches.len();
        let mut failed = 0usize;

        for (idx, batch) in batches.iter().enumerate() {
            let Err(e) = messenger.send_markdown(chat_id, batch).await else {
                continue;
            };
            failed += 1;
            tracing::warn!(
                chat_id = chat_id.0,
                batch = idx + 1,
                total,
                error = %e,
                "failed to send mention batch"
            );
            let fallback = format!(
                "Couldn't send mention batch {} of {total}. Please try again later.",
                idx + 1
            );
            if let Err(e) = messenger.send_text(chat_id, &fallback).await {
                tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send fallback notice");
            }
        }

        tracing::info!(
            chat_id = chat_id.0,
            members = members.len(),
            batches = total,
            failed,
            "mentioned chat members"
        );

        Ok(MentionOutcome {
            batches: total,
            failed,
            members: members.len(),
        })
    }
}
