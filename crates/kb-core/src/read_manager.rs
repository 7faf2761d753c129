//! 4.G Read Manager — `markReadUpTo` and the dual-mode virtual-buffer purge.

use crate::core::Core;
use kb_protocol::{reserved, thread_root_id, ChannelId, MessageId, OutboundCommand};

impl Core {
    /// `markReadUpTo` (§6 Command API). Returns the outbound `mark_read`
    /// command to send, or `None` if this channel/message is a no-op
    /// (synthetic service, unknown message, or a debounced repeat).
    pub fn mark_read_up_to(&mut self, channel_id: &ChannelId, message_id: &MessageId) -> Option<OutboundCommand> {
        let channel = self.workspace.channel(channel_id)?.clone();
        if channel.service.as_str() == reserved::INTERNAL_SERVICE
            || channel.service.as_str() == reserved::AGGREGATION_SERVICE
            || channel_id.as_str() == reserved::SYSTEM_CHANNEL
        {
            return None;
        }

        if self.last_acked.get(channel_id) == Some(message_id) {
            return None;
        }

        // `timestamp` is ms; `last_read_at` is seconds (§3).
        let message_timestamp = self.entities.get(message_id)?.timestamp;

        if let Some(stored) = self.workspace.channel_mut(channel_id) {
            stored.last_read_at = Some(stored.last_read_at.unwrap_or(0).max(message_timestamp / 1000));
        }
        self.last_acked.insert(channel_id.clone(), message_id.clone());

        let command_channel_id = if channel.is_thread {
            channel.parent_channel.clone().unwrap_or_else(|| channel_id.clone())
        } else {
            channel_id.clone()
        };

        self.purge_virtual_buffers(channel_id, &channel, message_timestamp);
        self.publish();

        Some(OutboundCommand::MarkRead {
            service_id: channel.service,
            channel_id: command_channel_id,
            message_id: message_id.clone(),
        })
    }

    fn purge_virtual_buffers(&mut self, channel_id: &ChannelId, channel: &kb_protocol::Channel, read_ts: i64) {
        let root_id = if channel.is_thread {
            thread_root_id(channel_id)
        } else {
            None
        };
        let is_thread_mode = channel.is_thread;
        let channel_id = channel_id.clone();

        for virtual_id in [ChannelId::from(reserved::TRIAGE_CHANNEL), ChannelId::from(reserved::INBOX_CHANNEL)] {
            let entities = &self.entities;
            let keep = |id: &MessageId| -> bool {
                let Some(m) = entities.get(id) else {
                    // Buffer corruption (§7): tolerated transiently, dropped defensively.
                    return false;
                };
                if is_thread_mode {
                    let Some(root_id) = &root_id else { return true };
                    let is_member = &m.id == root_id || m.thread_id.as_ref() == Some(root_id);
                    !is_member || m.timestamp > read_ts
                } else {
                    m.source_channel.as_ref() != Some(&channel_id) || m.thread_id.is_some() || m.timestamp > read_ts
                }
            };
            self.workspace.retain_virtual_buffer(&virtual_id, keep);
        }
    }
}
