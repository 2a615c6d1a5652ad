//! Telegram update handlers.
//!
//! Each update is translated into a core `IncomingEvent` and handed to the
//! reactor, which logs its own failures. Handlers therefore always return
//! `Ok`, so one bad update never stalls the dispatcher.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod translate;

pub use translate::to_event;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(event) = to_event(&msg) else {
        return Ok(());
    };

    tracing::debug!(
        chat_id = msg.chat.id.0,
        message_id = msg.id.0,
        event = event.kind(),
        "update received"
    );
    state.reactor.dispatch(event).await;

    Ok(())
}
