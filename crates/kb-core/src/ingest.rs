//! Wires the six wire-level inbound events (§6) onto the component
//! operations they drive, and owns the hydration queue two of them feed.
//! `channel_list`/`thread_subscription_list` enqueue resync commands at
//! `Config::hydration_throttle_ms` spacing; the host drains the queue on
//! its own timer, the same externally-driven-debounce shape
//! `retry_pending_hint` already uses for the 300ms pending-hint retry.

use crate::core::Core;
use kb_protocol::{
    Channel, ChannelCategory, InboundEvent, Message, MessageStatus, OutboundCommand, ServiceId,
    ThreadSubscriptionEntry, User, WireChannel, WireMessage, WireUser,
};

fn user_from_wire(wire: WireUser, service: &ServiceId) -> User {
    User {
        id: wire.id,
        name: wire.display_name,
        color: wire.color,
        service_id: Some(service.clone()),
        channel_prefix: None,
    }
}

fn category_from_wire(category: Option<&str>) -> Option<ChannelCategory> {
    match category {
        Some("channel") => Some(ChannelCategory::Channel),
        Some("direct") => Some(ChannelCategory::Direct),
        Some("group") => Some(ChannelCategory::Group),
        _ => None,
    }
}

fn channel_from_wire(wire: WireChannel, service: &ServiceId) -> Channel {
    Channel {
        id: wire.id,
        name: wire.name,
        service: service.clone(),
        category: category_from_wire(wire.category.as_deref()),
        starred: wire.starred,
        last_read_at: wire.last_read_at,
        last_post_at: wire.last_post_at,
        mass: Some(wire.mass),
        is_thread: false,
        thread_id: None,
        parent_channel: None,
        parent_message: None,
    }
}

/// Candidate for hydration per §6's `channel_list` effect: "fetch channels
/// with outstanding mentions or unread-starred channels."
fn needs_hydration(wire: &WireChannel) -> bool {
    wire.mentions > 0 || (wire.starred && wire.unread > 0)
}

fn message_from_wire(wire: WireMessage, author_service: &ServiceId) -> Message {
    Message {
        id: wire.id,
        client_id: wire.client_id,
        status: Some(MessageStatus::Sent),
        author: user_from_wire(wire.author, author_service),
        content: wire.body,
        timestamp: wire.timestamp,
        reactions: wire.reactions,
        reply_count: wire.replies.map(|r| r.count),
        attachments: wire.attachments,
        thread_id: None,
        source_channel: None,
        bucket: None,
    }
}

impl Core {
    /// Applies one transport-decoded event (§6 inbound table) to the core.
    pub fn handle_inbound_event(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::SelfInfo { service, user, channel_prefix } => {
                let identity = kb_protocol::Identity {
                    service_id: service.clone(),
                    user: user_from_wire(user, &service),
                    channel_prefix,
                };
                self.set_identity(identity);
            }
            InboundEvent::ChannelList { service, channels } => {
                let to_hydrate: Vec<OutboundCommand> = channels
                    .iter()
                    .filter(|c| needs_hydration(c))
                    .map(|c| OutboundCommand::SwitchChannel {
                        service_id: service.clone(),
                        channel_id: c.id.clone(),
                    })
                    .collect();
                let channels: Vec<Channel> = channels.into_iter().map(|c| channel_from_wire(c, &service)).collect();
                self.upsert_channels(channels);
                self.hydration_queue.extend(to_hydrate);
            }
            InboundEvent::UserList { service, users } => {
                let users: Vec<User> = users.into_iter().map(|u| user_from_wire(u, &service)).collect();
                self.upsert_users(users);
            }
            InboundEvent::Message { service, channel_id, thread_id, message } => {
                let channel = self
                    .workspace
                    .channel(&channel_id)
                    .cloned()
                    .unwrap_or_else(|| Channel::new(channel_id.clone(), channel_id.as_str(), service.clone()));
                let msg = message_from_wire(message, &service);
                self.dispatch_message(channel, msg, thread_id);
            }
            InboundEvent::MessageUpdate { message } => {
                self.update_message(&message.id, message.body);
            }
            InboundEvent::MessageDelete { message_id } => {
                self.remove_message(&message_id);
            }
            InboundEvent::MessageAck { client_id, real_id, text } => {
                self.reconcile_ack(client_id, real_id, text);
            }
            InboundEvent::ThreadSubscriptionList { service, thread_ids } => {
                self.hydrate_participated_threads(&service, thread_ids);
            }
        }
    }

    /// `hydrateParticipatedThreads` (§6 Command API) / the
    /// `thread_subscription_list` inbound effect: seed `participatedThreads`
    /// for every subscribed root, and enqueue a throttled `fetch_thread` for
    /// the ones with outstanding unread replies.
    pub fn hydrate_participated_threads(&mut self, service: &ServiceId, entries: Vec<ThreadSubscriptionEntry>) {
        for entry in entries {
            self.participated_threads.insert(entry.id.clone());
            if entry.unread {
                self.hydration_queue.push_back(OutboundCommand::FetchThread {
                    service_id: service.clone(),
                    channel_id: entry.channel_id,
                    thread_id: entry.id,
                });
            }
        }
        self.publish();
    }

    /// Pops the next queued hydration command, if any. The host drains this
    /// on its own timer spaced by `Config::hydration_throttle_ms` — `Core`
    /// never sleeps internally (§4.E purity, §9 Open Question 3).
    pub fn drain_next_hydration(&mut self) -> Option<OutboundCommand> {
        self.hydration_queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use kb_protocol::{ChannelId, MessageId, UserId, WireChannel, WireUser};

    fn core() -> Core {
        Core::new(Config::default())
    }

    fn wire_user(id: &str) -> WireUser {
        WireUser { id: UserId::from(id), display_name: id.to_owned(), color: None }
    }

    #[test]
    fn self_info_sets_identity() {
        let mut c = core();
        c.handle_inbound_event(InboundEvent::SelfInfo {
            service: ServiceId::from("slack"),
            user: wire_user("me"),
            channel_prefix: Some('#'),
        });
        assert!(c.identity(&ServiceId::from("slack")).is_some());
    }

    #[test]
    fn channel_list_upserts_and_enqueues_hydration_for_mentioned_channels() {
        let mut c = core();
        c.handle_inbound_event(InboundEvent::ChannelList {
            service: ServiceId::from("slack"),
            channels: vec![
                WireChannel {
                    id: ChannelId::from("c1"),
                    name: "general".into(),
                    last_read_at: None,
                    last_post_at: None,
                    mass: 0,
                    starred: false,
                    category: Some("channel".into()),
                    unread: 0,
                    mentions: 2,
                },
                WireChannel {
                    id: ChannelId::from("c2"),
                    name: "random".into(),
                    last_read_at: None,
                    last_post_at: None,
                    mass: 0,
                    starred: false,
                    category: None,
                    unread: 0,
                    mentions: 0,
                },
            ],
        });
        assert!(c.workspace().channel(&ChannelId::from("c1")).is_some());
        assert!(c.workspace().channel(&ChannelId::from("c2")).is_some());
        assert_eq!(
            c.drain_next_hydration(),
            Some(OutboundCommand::SwitchChannel { service_id: ServiceId::from("slack"), channel_id: ChannelId::from("c1") })
        );
        assert_eq!(c.drain_next_hydration(), None);
    }

    #[test]
    fn thread_subscription_list_seeds_participated_and_queues_unread_fetch() {
        let mut c = core();
        c.handle_inbound_event(InboundEvent::ThreadSubscriptionList {
            service: ServiceId::from("slack"),
            thread_ids: vec![
                ThreadSubscriptionEntry { id: MessageId::from("root1"), channel_id: ChannelId::from("c1"), unread: true },
                ThreadSubscriptionEntry { id: MessageId::from("root2"), channel_id: ChannelId::from("c1"), unread: false },
            ],
        });
        assert!(c.participated_threads().contains(&MessageId::from("root1")));
        assert!(c.participated_threads().contains(&MessageId::from("root2")));
        assert_eq!(
            c.drain_next_hydration(),
            Some(OutboundCommand::FetchThread {
                service_id: ServiceId::from("slack"),
                channel_id: ChannelId::from("c1"),
                thread_id: MessageId::from("root1"),
            })
        );
        assert_eq!(c.drain_next_hydration(), None);
    }

    #[test]
    fn message_delete_event_removes_from_buffers() {
        let mut c = core();
        let ch = Channel::new(ChannelId::from("c1"), "c1", ServiceId::from("slack"));
        c.workspace.dispatch_message_id(ch, MessageId::from("m1"));
        c.entities.upsert(Message {
            id: MessageId::from("m1"),
            client_id: None,
            status: Some(MessageStatus::Sent),
            author: User { id: UserId::from("u1"), name: "U".into(), color: None, service_id: None, channel_prefix: None },
            content: "hi".into(),
            timestamp: 0,
            reactions: Default::default(),
            reply_count: None,
            attachments: vec![],
            thread_id: None,
            source_channel: None,
            bucket: None,
        });
        c.handle_inbound_event(InboundEvent::MessageDelete { message_id: MessageId::from("m1") });
        assert!(!c.workspace().buffer(&ChannelId::from("c1")).unwrap().contains(&MessageId::from("m1")));
        assert!(c.entities().contains(&MessageId::from("m1")));
    }
}
