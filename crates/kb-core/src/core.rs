//! The single owned `Core` value (§9 "Global singletons"). Every operation
//! in §4 is a method here (split across sibling modules by component:
//! [`crate::dispatch`], [`crate::read_manager`], [`crate::positioner`],
//! [`crate::ack_reconciler`]); this module owns the state they mutate.

use crate::config::Config;
use crate::entity_store::EntityStore;
use crate::observable::{Observable, StateSnapshot};
use crate::sys_log::{LogLevel, SysLog};
use crate::workspace::Workspace;
use kb_protocol::{reserved, Channel, ChannelId, Identity, MessageId, OutboundCommand, ServiceId, UnreadState, User, UserId, VirtualCounts};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::watch;

pub struct Core {
    pub(crate) entities: EntityStore,
    pub(crate) workspace: Workspace,
    pub(crate) identities: HashMap<ServiceId, Identity>,
    pub(crate) users: HashMap<UserId, User>,
    /// Root message ids of threads the local user has participated in.
    pub(crate) participated_threads: HashSet<MessageId>,
    pub(crate) unread: HashMap<ChannelId, UnreadState>,
    pub(crate) virtual_counts: VirtualCounts,
    pub(crate) config: Config,
    pub(crate) sys_log: SysLog,
    observable: Observable,
    /// Last message id the server was told about per channel, for the
    /// mark-read ack debounce (§4.G).
    pub(crate) last_acked: HashMap<ChannelId, MessageId>,
    /// Commands queued by `hydrateParticipatedThreads`/`channel_list`
    /// resync, drained by the host at `Config::hydration_throttle_ms`
    /// spacing (§6, §9 Open Question 3). `Core` never sleeps internally.
    pub(crate) hydration_queue: VecDeque<OutboundCommand>,
}

impl Core {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut workspace = Workspace::new(config.navigation_stack_capacity);
        // The three synthetic channels are created at startup (§3 Lifecycle).
        workspace.ensure(Channel::new(
            ChannelId::from(reserved::SYSTEM_CHANNEL),
            "system",
            ServiceId::from(reserved::INTERNAL_SERVICE),
        ));
        workspace.ensure(Channel::new(
            ChannelId::from(reserved::TRIAGE_CHANNEL),
            "triage",
            ServiceId::from(reserved::AGGREGATION_SERVICE),
        ));
        workspace.ensure(Channel::new(
            ChannelId::from(reserved::INBOX_CHANNEL),
            "inbox",
            ServiceId::from(reserved::AGGREGATION_SERVICE),
        ));

        Self {
            entities: EntityStore::new(),
            workspace,
            identities: HashMap::new(),
            users: HashMap::new(),
            participated_threads: HashSet::new(),
            unread: HashMap::new(),
            virtual_counts: VirtualCounts::default(),
            config,
            sys_log: SysLog::new(),
            observable: Observable::new().0,
            last_acked: HashMap::new(),
            hydration_queue: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.observable.subscribe()
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[must_use]
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    #[must_use]
    pub fn identity(&self, service: &ServiceId) -> Option<&Identity> {
        self.identities.get(service)
    }

    #[must_use]
    pub fn unread_state(&self, channel: &ChannelId) -> UnreadState {
        self.unread.get(channel).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn virtual_counts(&self) -> VirtualCounts {
        self.virtual_counts
    }

    #[must_use]
    pub fn participated_threads(&self) -> &HashSet<MessageId> {
        &self.participated_threads
    }

    /// `setIdentity` (§6 Command API).
    pub fn set_identity(&mut self, identity: Identity) {
        self.identities.insert(identity.service_id.clone(), identity);
        self.publish();
    }

    /// `upsertUsers` (§6 Command API).
    pub fn upsert_users(&mut self, users: impl IntoIterator<Item = User>) {
        for user in users {
            self.users.insert(user.id.clone(), user);
        }
        self.publish();
    }

    /// `upsertChannels` (§6 Command API).
    pub fn upsert_channels(&mut self, channels: impl IntoIterator<Item = Channel>) {
        for channel in channels {
            self.workspace.ensure(channel);
        }
        self.publish();
    }

    /// `updateUnreadState` (§6 Command API).
    pub fn update_unread_state(&mut self, channel: ChannelId, state: UnreadState) {
        self.unread.insert(channel, state);
        self.publish();
    }

    /// `clearUnreadCount` (§6 Command API / §4.G).
    pub fn clear_unread_count(&mut self, channel: &ChannelId) {
        if let Some(state) = self.unread.get_mut(channel) {
            state.count = 0;
            state.has_mention = false;
        }
        self.publish();
    }

    /// The host's cue, on observing `TransportStatus::Connected` from
    /// [`crate::transport::run_transport_loop`], to resynchronize the
    /// backend with whatever channel is currently active (§4.J, §7: "on
    /// reconnect, a `switch_channel` is re-emitted to resynchronize").
    /// Returns `None` if there's no active channel or it's one of the
    /// three synthetic channels, which no backend serves.
    #[must_use]
    pub fn on_transport_connected(&mut self) -> Option<OutboundCommand> {
        let active = self.workspace.active_channel()?.clone();
        if matches!(active.as_str(), reserved::SYSTEM_CHANNEL | reserved::TRIAGE_CHANNEL | reserved::INBOX_CHANNEL) {
            return None;
        }
        let channel = self.workspace.channel(&active)?;
        Some(OutboundCommand::SwitchChannel {
            service_id: channel.service.clone(),
            channel_id: channel.id.clone(),
        })
    }

    /// `reset` (§6 Command API) — drop all session state, synthetic
    /// channels excluded (they're recreated by `new`).
    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Core::new(config);
    }

    pub(crate) fn recompute_virtual_counts(&mut self) {
        let triage_len = self
            .workspace
            .buffer(&ChannelId::from(reserved::TRIAGE_CHANNEL))
            .map_or(0, crate::buffer::ChannelBuffer::len);
        let inbox_len = self
            .workspace
            .buffer(&ChannelId::from(reserved::INBOX_CHANNEL))
            .map_or(0, crate::buffer::ChannelBuffer::len);
        self.virtual_counts = VirtualCounts {
            triage: triage_len,
            inbox: inbox_len,
        };
    }

    /// Routes a transport/parse-level event into the `system` channel as a
    /// structured entry (§7, §4.L). `pub` so a host driving
    /// [`crate::transport::run_transport_loop`] externally — which owns the
    /// wire, not `Core` — can forward that loop's error branches here.
    pub fn log_system(&mut self, level: LogLevel, text: impl AsRef<str>) {
        let now = crate::clock::now_millis();
        let msg = self.sys_log.entry(level, text, now);
        let id = msg.id.clone();
        self.entities.upsert(msg);
        self.workspace
            .dispatch_message_id(system_channel(), id);
    }

    pub(crate) fn publish(&mut self) {
        self.recompute_virtual_counts();
        let active = self.workspace.active_channel().cloned();
        let window = active.as_ref().and_then(|id| self.workspace.window(id));
        let snapshot = StateSnapshot {
            active_channel: active.clone(),
            cursor_index: window.map_or(-1, |w| w.cursor_index),
            is_attached: window.is_some_and(|w| w.is_attached),
            unread_marker_index: window.map_or(-1, |w| w.unread_marker_index),
            unread: self.unread.clone(),
            virtual_counts: self.virtual_counts,
        };
        self.observable.publish(snapshot);
    }
}

pub(crate) fn system_channel() -> Channel {
    Channel::new(
        ChannelId::from(reserved::SYSTEM_CHANNEL),
        "system",
        ServiceId::from(reserved::INTERNAL_SERVICE),
    )
}

pub(crate) fn triage_channel() -> Channel {
    Channel::new(
        ChannelId::from(reserved::TRIAGE_CHANNEL),
        "triage",
        ServiceId::from(reserved::AGGREGATION_SERVICE),
    )
}

pub(crate) fn inbox_channel() -> Channel {
    Channel::new(
        ChannelId::from(reserved::INBOX_CHANNEL),
        "inbox",
        ServiceId::from(reserved::AGGREGATION_SERVICE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_synthetic_channels() {
        let core = Core::new(Config::default());
        assert!(core.workspace().channel(&ChannelId::from(reserved::SYSTEM_CHANNEL)).is_some());
        assert!(core.workspace().channel(&ChannelId::from(reserved::TRIAGE_CHANNEL)).is_some());
        assert!(core.workspace().channel(&ChannelId::from(reserved::INBOX_CHANNEL)).is_some());
    }

    #[test]
    fn reset_clears_identities_but_recreates_synthetic_channels() {
        let mut core = Core::new(Config::default());
        core.set_identity(Identity {
            service_id: ServiceId::from("slack"),
            user: User {
                id: UserId::from("u1"),
                name: "Me".into(),
                color: None,
                service_id: None,
                channel_prefix: None,
            },
            channel_prefix: None,
        });
        core.reset();
        assert!(core.identity(&ServiceId::from("slack")).is_none());
        assert!(core.workspace().channel(&ChannelId::from(reserved::TRIAGE_CHANNEL)).is_some());
    }

    #[test]
    fn on_transport_connected_reemits_switch_channel_for_active_channel() {
        let mut core = Core::new(Config::default());
        core.workspace.open_channel(Channel::new(ChannelId::from("c1"), "c1", ServiceId::from("slack")));
        let cmd = core.on_transport_connected();
        assert_eq!(
            cmd,
            Some(OutboundCommand::SwitchChannel {
                service_id: ServiceId::from("slack"),
                channel_id: ChannelId::from("c1"),
            })
        );
    }

    #[test]
    fn on_transport_connected_is_none_without_an_active_channel() {
        let mut core = Core::new(Config::default());
        assert_eq!(core.on_transport_connected(), None);
    }

    #[test]
    fn on_transport_connected_is_none_for_synthetic_active_channel() {
        let mut core = Core::new(Config::default());
        core.workspace.open_channel(triage_channel());
        assert_eq!(core.on_transport_connected(), None);
    }
}
