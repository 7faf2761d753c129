//! 4.I Ack Reconciler — resolves pending optimistic messages against
//! server acknowledgements.

use crate::core::Core;
use kb_protocol::{MessageId, MessageStatus};

impl Core {
    /// `handleAck` (§6 Command API). `server_content`, if present,
    /// overwrites the stored content.
    pub fn reconcile_ack(&mut self, temp_id: MessageId, real_id: MessageId, server_content: Option<String>) {
        if temp_id == real_id {
            // Identity match: no buffer changes.
            let applied = self.entities.update(&temp_id, |m| {
                m.status = Some(MessageStatus::Sent);
                if let Some(content) = &server_content {
                    m.content.clone_from(content);
                }
            });
            if applied {
                self.publish();
            }
            return;
        }

        if !self.entities.contains(&temp_id) {
            // Stale ack for an unknown tempId (§7): silently ignored.
            return;
        }

        if self.entities.contains(&real_id) {
            // The real message already arrived via the event stream.
            self.entities.update(&real_id, |m| {
                m.status = Some(MessageStatus::Sent);
                m.client_id = Some(temp_id.clone());
                if let Some(content) = &server_content {
                    m.content.clone_from(content);
                }
            });
            self.entities.remove(&temp_id);
        } else {
            // Mutate the pending entity in place; object identity
            // preserved for UI stability by re-inserting under the new id.
            let client_id = temp_id.clone();
            self.entities.update(&temp_id, |m| {
                m.client_id = Some(client_id.clone());
                m.status = Some(MessageStatus::Sent);
                if let Some(content) = &server_content {
                    m.content.clone_from(content);
                }
            });
            self.entities.rekey(&temp_id, real_id.clone());
        }

        self.workspace.rekey_message_in_buffers(&temp_id, &real_id);
        self.publish();
    }
}
