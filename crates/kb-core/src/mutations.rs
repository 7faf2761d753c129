//! Single-message UI/wire-triggered mutations from §6: `updateMessage`,
//! `removeMessage`, `handleReaction`. Per §7, a missing entity on any of
//! these three is a no-op, never an error.

use crate::core::Core;
use kb_protocol::{emoji, MessageId, ReactionAction, UserId};

impl Core {
    /// `updateMessage` (§6) / the `message_update` inbound effect: overwrite
    /// `content` in place.
    pub fn update_message(&mut self, message_id: &MessageId, body: String) {
        if self.entities.update(message_id, |m| m.content = body) {
            self.publish();
        }
    }

    /// `removeMessage` (§6) / the `message_delete` inbound effect: drop the
    /// id from every buffer it appears in. The entity itself is retained —
    /// removal is from the current view, not the store (§7).
    pub fn remove_message(&mut self, message_id: &MessageId) {
        self.workspace.remove_message_from_buffers(message_id);
        self.publish();
    }

    /// `handleReaction` (§6). Canonicalizes `reaction` (§9 emoji
    /// normalization) and adds/removes `user_id` from that key's member
    /// list, pruning the key once its list is empty. No-op if the message
    /// is unknown.
    pub fn handle_reaction(&mut self, message_id: &MessageId, user_id: &UserId, reaction: &str, action: ReactionAction) {
        let key = emoji::canonicalize(reaction);
        let applied = self.entities.update(message_id, |m| {
            let members = m.reactions.entry(key.clone()).or_default();
            match action {
                ReactionAction::Add => {
                    if !members.contains(user_id) {
                        members.push(user_id.clone());
                    }
                }
                ReactionAction::Remove => {
                    members.retain(|u| u != user_id);
                }
            }
            if members.is_empty() {
                m.reactions.remove(&key);
            }
        });
        if applied {
            self.publish();
        }
    }
}
