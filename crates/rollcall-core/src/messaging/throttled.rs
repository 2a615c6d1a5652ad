use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::port::MessagingPort,
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between sends in one group (Telegram allows ~20/min per group).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

/// Hands out send slots at least `spacing` apart.
#[derive(Debug)]
struct Pacer {
    spacing: Duration,
    next_free: Instant,
}

impl Pacer {
    fn new(spacing: Duration, now: Instant) -> Self {
        Self {
            spacing,
            next_free: now,
        }
    }

    /// Claim the next free slot and return how long to wait for it.
    fn claim(&mut self, now: Instant) -> Duration {
        let slot = self.next_free.max(now);
        self.next_free = slot + self.spacing;
        slot - now
    }

    fn is_idle(&self, now: Instant) -> bool {
        self.next_free <= now
    }
}

/// Per-chat pacers beyond this count trigger a sweep of the idle ones.
const CHAT_PACER_SWEEP_AT: usize = 256;

#[derive(Debug)]
struct Pacers {
    global: Pacer,
    chats: HashMap<ChatId, Pacer>,
}

/// MessagingPort decorator that spaces out outbound calls.
///
/// Mention batches go out back-to-back in one chat; this keeps them under the
/// group flood limit instead of relying on 429 retries.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    per_chat_spacing: Duration,
    pacers: Mutex<Pacers>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            per_chat_spacing: cfg.per_chat_min_interval,
            pacers: Mutex::new(Pacers {
                global: Pacer::new(cfg.global_min_interval, Instant::now()),
                chats: HashMap::new(),
            }),
        }
    }

    /// Wait for a global slot and, for sends, a slot in `chat` as well.
    async fn pace(&self, chat: Option<ChatId>) {
        let wait = {
            let mut pacers = self.pacers.lock().await;
            let now = Instant::now();
            let global = pacers.global.claim(now);
            match chat {
                None => global,
                Some(chat_id) => {
                    if pacers.chats.len() >= CHAT_PACER_SWEEP_AT {
                        pacers.chats.retain(|_, p| !p.is_idle(now));
                    }
                    let spacing = self.per_chat_spacing;
                    let in_chat = pacers
                        .chats
                        .entry(chat_id)
                        .or_insert_with(|| Pacer::new(spacing, now))
                        .claim(now);
                    global.max(in_chat)
                }
            }
        };

        if !wait.is_zero() {
            sleep(wait).await;
        }
    }

    #[cfg(test)]
    async fn tracked_chats(&self) -> usize {
        self.pacers.lock().await.chats.len()
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.pace(Some(chat_id)).await;
        self.inner.send_text(chat_id, text).await
    }

    async fn send_markdown(&self, chat_id: ChatId, markdown: &str) -> Result<MessageRef> {
        self.pace(Some(chat_id)).await;
        self.inner.send_markdown(chat_id, markdown).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        // Deletes don't count against the per-group send limit.
        self.pace(None).await;
        self.inner.delete_message(msg).await
    }
}
