use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use rollcall_core::messaging::throttled::{ThrottleConfig, ThrottledMessenger};
use rollcall_core::{
    config::Config, messaging::port::MessagingPort, reactor::EventReactor, roster::RosterStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub reactor: Arc<EventReactor>,
}

/// Long-poll Telegram until Ctrl-C.
pub async fn run_polling(cfg: Arc<Config>, store: Arc<RosterStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let username = match &cfg.bot_username {
        Some(name) => name.clone(),
        None => {
            let me = bot
                .get_me()
                .await
                .map_err(|e| anyhow::anyhow!("failed to resolve bot username via getMe: {e}"))?;
            me.username().to_string()
        }
    };
    tracing::info!(
        username = %username,
        roster = %cfg.roster_file.display(),
        batch_size = cfg.mention_batch_size,
        delete_leave_messages = cfg.delete_leave_messages,
        "rollcall started"
    );

    // Mention batches go out back-to-back; the throttle keeps them under group flood limits.
    // A single 429 RetryAfter retry still happens at the Telegram adapter layer.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let reactor = EventReactor::new(store, messenger, cfg.settings(username))?;
    let state = Arc::new(AppState {
        reactor: Arc::new(reactor),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        // Only messages matter; drop everything else silently.
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("rollcall stopped");
    Ok(())
}
