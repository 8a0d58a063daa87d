//! Test fixtures for creating common test objects
//!
//! A small cast of contacts resolved by every fixture resolver, and a
//! builder wiring a [`TpGroup`] to a [`MockChannelProxy`].

use crate::config::GroupConfig;
use crate::tp_group::adapters::{MockChannelProxy, MockContactResolver};
use crate::tp_group::{
    ChangeReason, ChannelRef, Contact, GroupEvent, Handle, HandleType, LocalPendingInfo,
    MembersChanged, TpGroup,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub const SELF: Handle = Handle(1);
pub const ALICE: Handle = Handle(2);
pub const BOB: Handle = Handle(3);
pub const CAROL: Handle = Handle(4);
pub const DAVE: Handle = Handle(5);

/// Handle of the room every fixture channel targets
pub const ROOM: Handle = Handle(100);
pub const ROOM_NAME: &str = "empathy@conference.example.com";

/// The contact the fixture resolver returns for `handle`
pub fn contact(handle: Handle) -> Contact {
    let (id, alias) = match handle {
        SELF => ("me@example.com", "Me"),
        ALICE => ("alice@example.com", "Alice"),
        BOB => ("bob@example.com", "Bob"),
        CAROL => ("carol@example.com", "Carol"),
        DAVE => ("dave@example.com", "Dave"),
        _ => return Contact::new(handle, format!("user{}@example.com", handle)),
    };
    Contact::new(handle, id).with_alias(alias)
}

/// Resolver knowing [`SELF`] through [`DAVE`] plus handles 6 to 20
pub fn test_resolver() -> MockContactResolver {
    MockContactResolver::with_contacts((1..=20).map(|h| contact(Handle(h))))
}

pub fn test_channel() -> ChannelRef {
    ChannelRef::new(
        "/org/freedesktop/Telepathy/Connection/gabble/jabber/me_40example_2ecom/MucChannel1",
        HandleType::Room,
        ROOM,
    )
}

/// Group config with fast retries
pub fn test_config() -> GroupConfig {
    GroupConfig {
        bootstrap_retry_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

/// Batch adding `handles`
pub fn added(handles: &[Handle]) -> MembersChanged {
    MembersChanged {
        added: handles.to_vec(),
        ..Default::default()
    }
}

/// Batch removing `handles`
pub fn removed(handles: &[Handle]) -> MembersChanged {
    MembersChanged {
        removed: handles.to_vec(),
        ..Default::default()
    }
}

/// Local pending entry as the channel reports it
pub fn local_pending_info(member: Handle, actor: Handle, message: &str) -> LocalPendingInfo {
    LocalPendingInfo {
        member,
        actor,
        reason: ChangeReason::Invited,
        message: message.to_string(),
    }
}

/// A group under test with its collaborators
pub struct TestGroup {
    pub proxy: Arc<MockChannelProxy>,
    pub resolver: Arc<MockContactResolver>,
    pub group: TpGroup,
    pub events: broadcast::Receiver<GroupEvent>,
}

/// Builder for a [`TpGroup`] over a mock channel
pub struct TestGroupBuilder {
    proxy: MockChannelProxy,
    config: GroupConfig,
}

impl TestGroupBuilder {
    pub fn new() -> Self {
        Self {
            proxy: MockChannelProxy::new(test_channel())
                .with_self_handle(SELF)
                .with_name(ROOM, ROOM_NAME),
            config: test_config(),
        }
    }

    pub fn self_handle(mut self, handle: Handle) -> Self {
        self.proxy = self.proxy.with_self_handle(handle);
        self
    }

    pub fn members(mut self, handles: &[Handle]) -> Self {
        self.proxy = self.proxy.with_members(handles.to_vec());
        self
    }

    pub fn local_pending(mut self, entries: Vec<LocalPendingInfo>) -> Self {
        self.proxy = self.proxy.with_local_pending(entries);
        self
    }

    pub fn remote_pending(mut self, handles: &[Handle]) -> Self {
        self.proxy = self.proxy.with_remote_pending(handles.to_vec());
        self
    }

    /// Have the mock answer member requests with `MembersChanged`
    pub fn echo(mut self) -> Self {
        self.proxy = self.proxy.with_echo(true);
        self
    }

    pub fn config(mut self, config: GroupConfig) -> Self {
        self.config = config;
        self
    }

    /// Build without initializing; events are subscribed already
    pub fn build(self) -> TestGroup {
        let proxy = Arc::new(self.proxy);
        let resolver = Arc::new(test_resolver());
        let group = match TpGroup::new(proxy.clone(), resolver.clone(), self.config) {
            Ok(group) => group,
            Err(e) => panic!("Invalid test group config: {}", e),
        };
        let events = group.subscribe();

        TestGroup {
            proxy,
            resolver,
            group,
            events,
        }
    }

    /// Build, initialize and wait for readiness
    pub async fn build_ready(self) -> TestGroup {
        let test = self.build();
        if let Err(e) = test.group.initialize() {
            panic!("initialize failed: {}", e);
        }
        if let Err(e) = test.group.wait_ready().await {
            panic!("bootstrap failed: {}", e);
        }
        test
    }
}

impl Default for TestGroupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_fixture() {
        assert_eq!(contact(ALICE).name(), "Alice");
        assert_eq!(contact(Handle(9)).id(), "user9@example.com");
    }

    #[tokio::test]
    async fn test_build_ready() {
        let test = TestGroupBuilder::new().members(&[SELF, ALICE]).build_ready().await;

        assert!(test.group.is_ready());
        assert_eq!(test.group.members().await.len(), 2);
    }
}
