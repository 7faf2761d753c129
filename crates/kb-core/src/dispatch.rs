//! 4.F Dispatch / Routing Pipeline.

use crate::classifier::{classify, ClassifyInput};
use crate::core::{inbox_channel, triage_channel, Core};
use kb_protocol::{Bucket, Channel, ChannelId, Message, MessageId, MessageStatus};

impl Core {
    /// Run the full dispatch pipeline for one incoming message against
    /// `channel` (the real channel it arrived on — or, for thread replies,
    /// still the real parent channel; routing into `thread_<id>` happens
    /// here via `thread_id`).
    pub fn dispatch_message(&mut self, channel: Channel, mut msg: Message, thread_id: Option<MessageId>) {
        let channel_id = channel.id.clone();
        self.workspace.ensure(channel.clone());

        // 1. Normalize source_channel.
        if msg.source_channel.is_none() {
            msg.source_channel = Some(channel_id.clone());
        }
        msg.thread_id = msg.thread_id.or(thread_id);

        // 2. Echo detection.
        let is_own_voice = self
            .identities
            .get(&channel.service)
            .is_some_and(|id| id.user.id == msg.author.id);
        if is_own_voice {
            let pending_match = self
                .entities
                .values()
                .find(|m| m.status == Some(MessageStatus::Pending) && m.content == msg.content && m.id != msg.id)
                .map(|m| m.id.clone());
            if let Some(pending_id) = pending_match {
                let content = msg.content.clone();
                self.reconcile_ack(pending_id, msg.id.clone(), Some(content));
                return;
            }
        }

        // 3. Upsert.
        let msg_id = msg.id.clone();
        let msg_timestamp = msg.timestamp;

        // 4. Participated threads.
        if is_own_voice {
            if let Some(tid) = &msg.thread_id {
                self.participated_threads.insert(tid.clone());
            }
        }

        // 5. Classify.
        let identity = self.identities.get(&channel.service);
        let thread_read_at = msg
            .thread_id
            .as_ref()
            .and_then(|tid| self.workspace.channel(&kb_protocol::thread_channel_id(tid)))
            .and_then(|ch| ch.last_read_at);
        let bucket = classify(&ClassifyInput {
            msg: &msg,
            channel: self.workspace.channel(&channel_id).unwrap_or(&channel),
            identity,
            participated_threads: &self.participated_threads,
            thread_read_at,
            history_skew_tolerance_secs: self.config.history_skew_tolerance_secs,
        });
        msg.bucket = Some(bucket);
        self.entities.upsert(msg);

        // 6. Append to the channel buffer, and relevant virtual buffers.
        let target_channel = match self.entities.get(&msg_id).and_then(|m| m.thread_id.clone()) {
            Some(tid) => thread_identity(&channel, &tid),
            None => channel.clone(),
        };
        self.workspace.dispatch_message_id(target_channel, msg_id.clone());
        match bucket {
            Bucket::Ego | Bucket::Context => {
                self.workspace.dispatch_message_id(triage_channel(), msg_id.clone());
            }
            Bucket::Signal => {
                self.workspace.dispatch_message_id(inbox_channel(), msg_id.clone());
            }
            Bucket::Noise => {}
        }

        // 7. lastPostAt (seconds; msg_timestamp is ms).
        if let Some(ch) = self.workspace.channel_mut(&channel_id) {
            ch.last_post_at = Some(msg_timestamp / 1000);
        }

        // 8. Unread counters.
        let active = self.workspace.active_channel().cloned();
        if active.as_ref() != Some(&channel_id) && !is_own_voice && bucket != Bucket::Noise {
            let state = self.unread.entry(channel_id).or_default();
            state.count += 1;
            state.has_mention = state.has_mention || bucket == Bucket::Ego;
        }

        // 9. virtual_counts recomputed as part of publish().
        self.publish();
    }
}

fn thread_identity(parent: &Channel, root_id: &MessageId) -> Channel {
    Channel {
        id: kb_protocol::thread_channel_id(root_id),
        name: format!("thread:{root_id}"),
        service: parent.service.clone(),
        category: None,
        starred: false,
        last_read_at: None,
        last_post_at: None,
        mass: None,
        is_thread: true,
        thread_id: Some(root_id.clone()),
        parent_channel: Some(parent.id.clone()),
        parent_message: Some(root_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use kb_protocol::{ChannelCategory, Identity, ServiceId, User, UserId};

    fn core() -> Core {
        Core::new(Config::default())
    }

    fn channel(id: &str, starred: bool) -> Channel {
        let mut c = Channel::new(ChannelId::from(id), id, ServiceId::from("slack"));
        c.starred = starred;
        c
    }

    fn msg(id: &str, author: &str, content: &str, ts: i64) -> Message {
        Message {
            id: MessageId::from(id),
            client_id: None,
            status: Some(MessageStatus::Sent),
            author: User {
                id: UserId::from(author),
                name: author.into(),
                color: None,
                service_id: None,
                channel_prefix: None,
            },
            content: content.into(),
            timestamp: ts,
            reactions: Default::default(),
            reply_count: None,
            attachments: vec![],
            thread_id: None,
            source_channel: None,
            bucket: None,
        }
    }

    #[test]
    fn s1_inbox_root_thread_purge_dispatch_half() {
        let mut c = core();
        let ch = channel("c1", true);
        c.workspace.ensure(ch.clone());
        if let Some(stored) = c.workspace.channel_mut(&ChannelId::from("c1")) {
            stored.last_read_at = Some(0);
        }
        c.dispatch_message(ch.clone(), msg("m1", "other", "root", 10_000_000), None);
        assert_eq!(c.virtual_counts().inbox, 1);
        assert_eq!(c.virtual_counts().triage, 0);
        let stored = c.entities.get(&MessageId::from("m1")).unwrap();
        assert_eq!(stored.bucket, Some(Bucket::Signal));
        assert_eq!(stored.source_channel, Some(ChannelId::from("c1")));
    }

    #[test]
    fn s2_ego_over_signal() {
        let mut c = core();
        c.set_identity(Identity {
            service_id: ServiceId::from("slack"),
            user: User {
                id: UserId::from("me"),
                name: "TestUser".into(),
                color: None,
                service_id: None,
                channel_prefix: None,
            },
            channel_prefix: None,
        });
        let ch = channel("c1", true);
        let m = msg("m1", "other", "Hey @TestUser check this out", 10_000_000);
        c.dispatch_message(ch, m, None);
        assert_eq!(c.virtual_counts().triage, 1);
        assert_eq!(c.virtual_counts().inbox, 0);
    }

    #[test]
    fn noise_never_enters_virtual_buffers() {
        let mut c = core();
        let ch = channel("c1", false);
        let m = msg("m1", "other", "hi", 10_000_000);
        c.dispatch_message(ch, m, None);
        assert_eq!(c.virtual_counts().triage, 0);
        assert_eq!(c.virtual_counts().inbox, 0);
    }

    #[test]
    fn unread_increments_for_inactive_non_self_non_noise() {
        let mut c = core();
        let mut ch = channel("c1", false);
        ch.category = Some(ChannelCategory::Group);
        c.dispatch_message(ch, msg("m1", "other", "hi", 10_000_000), None);
        let state = c.unread_state(&ChannelId::from("c1"));
        assert_eq!(state.count, 1);
    }

    #[test]
    fn echo_detection_delegates_to_ack_reconciler() {
        let mut c = core();
        c.set_identity(Identity {
            service_id: ServiceId::from("slack"),
            user: User {
                id: UserId::from("me"),
                name: "Me".into(),
                color: None,
                service_id: None,
                channel_prefix: None,
            },
            channel_prefix: None,
        });
        let ch = channel("c1", false);
        let mut pending = msg("tmp1", "me", "hello world", 100);
        pending.status = Some(MessageStatus::Pending);
        c.entities.upsert(pending);
        c.workspace.dispatch_message_id(ch.clone(), MessageId::from("tmp1"));

        let echoed = msg("real1", "me", "hello world", 100);
        c.dispatch_message(ch, echoed, None);

        assert!(!c.entities.contains(&MessageId::from("tmp1")));
        let real = c.entities.get(&MessageId::from("real1")).unwrap();
        assert_eq!(real.client_id, Some(MessageId::from("tmp1")));
        assert_eq!(real.status, Some(MessageStatus::Sent));
    }
}
