//! 4.A Entity Store — a single `messageId -> Message` mapping.

use kb_protocol::{Message, MessageId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EntityStore {
    messages: HashMap<MessageId, Message>,
}

impl EntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Insert or overwrite a message.
    pub fn upsert(&mut self, msg: Message) {
        self.messages.insert(msg.id.clone(), msg);
    }

    /// Apply `patch` to the stored message for `id`, if present.
    pub fn update(&mut self, id: &MessageId, patch: impl FnOnce(&mut Message)) -> bool {
        if let Some(msg) = self.messages.get_mut(id) {
            patch(msg);
            true
        } else {
            false
        }
    }

    /// Re-key a message from `old_id` to `new_id`, preserving all other
    /// fields. No-op (returns `false`) if `old_id` is absent. Never deletes
    /// outside ack reconciliation.
    pub fn rekey(&mut self, old_id: &MessageId, new_id: MessageId) -> bool {
        let Some(mut msg) = self.messages.remove(old_id) else {
            return false;
        };
        msg.id = new_id.clone();
        self.messages.insert(new_id, msg);
        true
    }

    /// Remove an entity outright. Used only by ack reconciliation when a
    /// pending entity is superseded by one that already exists under the
    /// real id.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        self.messages.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_protocol::{MessageStatus, User, UserId};

    fn msg(id: &str) -> Message {
        Message {
            id: MessageId::from(id),
            client_id: None,
            status: Some(MessageStatus::Sent),
            author: User {
                id: UserId::from("u1"),
                name: "U".into(),
                color: None,
                service_id: None,
                channel_prefix: None,
            },
            content: "hi".into(),
            timestamp: 0,
            reactions: Default::default(),
            reply_count: None,
            attachments: vec![],
            thread_id: None,
            source_channel: None,
            bucket: None,
        }
    }

    #[test]
    fn upsert_then_get() {
        let mut store = EntityStore::new();
        store.upsert(msg("m1"));
        assert!(store.contains(&MessageId::from("m1")));
    }

    #[test]
    fn rekey_preserves_content_and_drops_old_key() {
        let mut store = EntityStore::new();
        store.upsert(msg("tmp"));
        assert!(store.rekey(&MessageId::from("tmp"), MessageId::from("real")));
        assert!(!store.contains(&MessageId::from("tmp")));
        let moved = store.get(&MessageId::from("real")).unwrap();
        assert_eq!(moved.id, MessageId::from("real"));
        assert_eq!(moved.content, "hi");
    }

    #[test]
    fn rekey_missing_old_id_is_noop() {
        let mut store = EntityStore::new();
        assert!(!store.rekey(&MessageId::from("missing"), MessageId::from("real")));
    }

    #[test]
    fn update_patches_in_place() {
        let mut store = EntityStore::new();
        store.upsert(msg("m1"));
        let applied = store.update(&MessageId::from("m1"), |m| m.content = "edited".into());
        assert!(applied);
        assert_eq!(store.get(&MessageId::from("m1")).unwrap().content, "edited");
    }

    #[test]
    fn update_missing_is_noop() {
        let mut store = EntityStore::new();
        assert!(!store.update(&MessageId::from("missing"), |_| {}));
    }
}
