//! Shared fakes for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::port::MessagingPort,
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text(ChatId, String),
    Markdown(ChatId, String),
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<Sent>>,
    deleted: Mutex<Vec<MessageRef>>,
    markdown_calls: Mutex<usize>,
    fail_deletes: bool,
    fail_markdown_calls: Vec<usize>,
}

impl FakeMessenger {
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    /// Fail the markdown sends with these 0-based call indices.
    pub fn failing_markdown(calls: &[usize]) -> Self {
        Self {
            fail_markdown_calls: calls.to_vec(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn markdown(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Markdown(_, m) => Some(m),
                Sent::Text(..) => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(_, t) => Some(t),
                Sent::Markdown(..) => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().unwrap().clone()
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        }
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(chat_id, text.to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn send_markdown(&self, chat_id: ChatId, markdown: &str) -> Result<MessageRef> {
        let call = {
            let mut n = self.markdown_calls.lock().unwrap();
            let call = *n;
            *n += 1;
            call
        };
        if self.fail_markdown_calls.contains(&call) {
            return Err(Error::External(
                "telegram error: can't parse entities".to_string(),
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Markdown(chat_id, markdown.to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        if self.fail_deletes {
            return Err(Error::External(
                "telegram error: message can't be deleted".to_string(),
            ));
        }
        self.deleted.lock().unwrap().push(msg);
        Ok(())
    }
}
