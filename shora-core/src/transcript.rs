//! Append-only message sequence shown to the user.

use crate::types::{Message, MessageId};
use tracing::debug;

/// Ordered transcript. Messages are only appended; the single allowed mutation is resolving a pending placeholder.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        debug!(message_id = %message.id, kind = ?message.kind, "transcript append");
        self.messages.push(message);
    }

    /// Fills a pending placeholder. Returns false if `id` is unknown or already resolved.
    pub fn resolve(&mut self, id: &MessageId, text: impl Into<String>) -> bool {
        match self.messages.iter_mut().find(|m| &m.id == id) {
            Some(msg) if msg.pending => {
                msg.text = text.into();
                msg.pending = false;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.get(id).is_some()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of placeholders still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.pending).count()
    }

    /// Ids of the placeholders still waiting for a reply, oldest first.
    pub fn pending_ids(&self) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|m| m.pending)
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
