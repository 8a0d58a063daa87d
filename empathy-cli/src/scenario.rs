//! Replay scenarios
//!
//! A scenario describes a channel as a connection manager would hold it
//! (contacts, initial membership) and the sequence of things that happen to
//! it afterwards. Replaying it runs a real [`TpGroup`] against the in-memory
//! channel and reports every event the group emits.

use anyhow::{bail, Context, Result};
use empathy_core::config::GroupConfig;
use empathy_core::tp_group::adapters::{MemberRequest, MockChannelProxy, MockContactResolver};
use empathy_core::tp_group::{
    ChannelRef, Contact, GroupEvent, GroupState, Handle, LocalPendingInfo, MembersChanged,
    MembershipSnapshot, TpGroup,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info};

/// How long to wait for the group to react to bootstrap or invalidation
const REACTION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub channel: ChannelRef,
    /// Identifier returned when the channel's target handle is inspected
    #[serde(default)]
    pub name: Option<String>,
    pub self_handle: Handle,
    /// Every contact the resolver knows about
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub members: Vec<Handle>,
    #[serde(default)]
    pub local_pending: Vec<LocalPendingInfo>,
    #[serde(default)]
    pub remote_pending: Vec<Handle>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Something that happens to the channel after it is set up
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// The channel reports a membership change
    MembersChanged(MembersChanged),
    AddMembers {
        handles: Vec<Handle>,
        #[serde(default)]
        message: String,
    },
    RemoveMembers {
        handles: Vec<Handle>,
        #[serde(default)]
        message: String,
    },
    AcceptInvitation,
    Close,
    /// The connection goes away
    Invalidate {
        #[serde(default)]
        reason: String,
    },
}

/// Final state after a replay
#[derive(Debug, Serialize)]
pub struct Summary {
    pub state: GroupState,
    pub name: Option<String>,
    pub snapshot: MembershipSnapshot,
    pub requests: Vec<MemberRequest>,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read scenario {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("malformed scenario {}", path.display()))
    }

    fn proxy(&self) -> MockChannelProxy {
        let mut proxy = MockChannelProxy::new(self.channel.clone())
            .with_self_handle(self.self_handle)
            .with_members(self.members.clone())
            .with_local_pending(self.local_pending.clone())
            .with_remote_pending(self.remote_pending.clone());
        if let Some(name) = &self.name {
            proxy = proxy.with_name(self.channel.handle, name.clone());
        }
        proxy
    }

    /// Largest number of events one replay phase can emit before it is drained
    ///
    /// The bootstrap emits one event per contact in the room plus `Ready`. A
    /// batch emits at most two events per contact, and each step may end with
    /// `Destroyed`.
    fn event_burst(&self) -> usize {
        2 * self.contacts.len() + self.steps.len() + 1
    }

    fn contacts(&self, handles: &[Handle]) -> Result<Vec<Contact>> {
        handles
            .iter()
            .map(|handle| {
                self.contacts
                    .iter()
                    .find(|c| c.handle() == *handle)
                    .cloned()
                    .with_context(|| format!("step names unknown contact {}", handle))
            })
            .collect()
    }
}

/// Run a scenario, handing every emitted event to `on_event` in order
pub async fn replay(
    scenario: Scenario,
    mut config: GroupConfig,
    mut on_event: impl FnMut(&GroupEvent),
) -> Result<Summary> {
    config.event_capacity = config.event_capacity.max(scenario.event_burst());

    let proxy = Arc::new(scenario.proxy());
    let resolver = Arc::new(MockContactResolver::with_contacts(scenario.contacts.clone()));
    let group = TpGroup::new(proxy.clone(), resolver, config)?;
    let mut events = group.subscribe();

    info!(channel = %group.channel(), steps = scenario.steps.len(), "Replaying scenario");
    group.initialize()?;

    loop {
        let event = next_event(&mut events).await?;
        on_event(&event);
        match event {
            GroupEvent::Ready => break,
            GroupEvent::BootstrapFailed { error } => bail!("bootstrap failed: {}", error),
            _ => {}
        }
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        debug!(index, ?step, "Replaying step");
        match step {
            Step::MembersChanged(batch) => {
                proxy.record(batch);
                group.apply_update(batch.clone()).await;
            }
            Step::AddMembers { handles, message } => {
                group.add_members(&scenario.contacts(handles)?, message).await?;
            }
            Step::RemoveMembers { handles, message } => {
                group.remove_members(&scenario.contacts(handles)?, message).await?;
            }
            Step::AcceptInvitation => group.accept_invitation().await?,
            Step::Close => {
                group.close().await?;
                wait_destroyed(&mut events, &mut on_event).await?;
            }
            Step::Invalidate { reason } => {
                proxy.invalidate(reason.clone());
                wait_destroyed(&mut events, &mut on_event).await?;
            }
        }

        loop {
            match events.try_recv() {
                Ok(event) => on_event(&event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    bail!("missed {} group events after step {}", missed, index)
                }
            }
        }
    }

    let name = match group.state() {
        GroupState::Destroyed => None,
        _ => group.name().await.unwrap_or(None),
    };

    Ok(Summary {
        state: group.state(),
        name,
        snapshot: group.snapshot().await,
        requests: proxy.requests(),
    })
}

async fn next_event(events: &mut broadcast::Receiver<GroupEvent>) -> Result<GroupEvent> {
    match tokio::time::timeout(REACTION_TIMEOUT, events.recv())
        .await
        .context("timed out waiting for the group")?
    {
        Ok(event) => Ok(event),
        Err(RecvError::Lagged(missed)) => bail!("missed {} group events", missed),
        Err(RecvError::Closed) => bail!("group event stream ended"),
    }
}

async fn wait_destroyed(
    events: &mut broadcast::Receiver<GroupEvent>,
    on_event: &mut impl FnMut(&GroupEvent),
) -> Result<()> {
    loop {
        let event = next_event(events).await?;
        on_event(&event);
        if event == GroupEvent::Destroyed {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use empathy_core::tp_group::HandleType;

    const SCENARIO: &str = r#"{
        "channel": {
            "object_path": "/org/freedesktop/Telepathy/Connection/gabble/jabber/me/MucChannel1",
            "handle_type": "room",
            "handle": 100
        },
        "name": "empathy@conference.example.com",
        "self_handle": 1,
        "contacts": [
            {"handle": 1, "id": "me@example.com"},
            {"handle": 2, "id": "alice@example.com", "alias": "Alice"},
            {"handle": 3, "id": "bob@example.com"}
        ],
        "members": [1, 2],
        "steps": [
            {"action": "members_changed", "local_pending": [3], "actor": 2, "reason": 4,
             "message": "join?"},
            {"action": "members_changed", "added": [3], "actor": 3},
            {"action": "remove_members", "handles": [2], "message": "bye"},
            {"action": "members_changed", "removed": [2], "actor": 1, "message": "bye"}
        ]
    }"#;

    fn scenario() -> Scenario {
        serde_json::from_str(SCENARIO).unwrap()
    }

    #[test]
    fn test_scenario_parses() {
        let scenario = scenario();
        assert_eq!(scenario.steps.len(), 4);
        assert!(matches!(scenario.steps[2], Step::RemoveMembers { .. }));
        assert!(scenario.local_pending.is_empty());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<Scenario, _> = serde_json::from_str(r#"{"chanel": {}}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_replay_reports_events_in_order() {
        let mut names = Vec::new();
        let summary = replay(scenario(), GroupConfig::default(), |e| names.push(e.name()))
            .await
            .unwrap();

        assert_eq!(
            names,
            vec![
                "member-added",
                "member-added",
                "ready",
                "local-pending",
                "member-added",
                "member-removed",
            ]
        );
        assert_eq!(summary.state, GroupState::Ready);
        assert_eq!(summary.name.as_deref(), Some("empathy@conference.example.com"));
        assert_eq!(summary.snapshot.members.len(), 2);
        assert_eq!(summary.requests.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_invalidation() {
        let mut scenario = scenario();
        scenario.steps = vec![Step::Invalidate {
            reason: "network".to_string(),
        }];

        let mut last = None;
        let summary = replay(scenario, GroupConfig::default(), |e| last = Some(e.clone()))
            .await
            .unwrap();

        assert_eq!(last, Some(GroupEvent::Destroyed));
        assert_eq!(summary.state, GroupState::Destroyed);
        assert!(summary.snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_replay_large_room_reports_every_event() {
        let handles: Vec<Handle> = (1..=300).map(Handle).collect();
        let scenario = Scenario {
            channel: ChannelRef::new(
                "/org/freedesktop/Telepathy/Connection/gabble/jabber/me/MucChannel2",
                HandleType::Room,
                Handle(1000),
            ),
            name: None,
            self_handle: Handle(1),
            contacts: handles
                .iter()
                .map(|h| Contact::new(*h, format!("user{}@example.com", h)))
                .collect(),
            members: handles.clone(),
            local_pending: Vec::new(),
            remote_pending: Vec::new(),
            steps: vec![Step::MembersChanged(MembersChanged {
                removed: handles[1..].to_vec(),
                ..Default::default()
            })],
        };

        let mut names = Vec::new();
        let summary = replay(scenario, GroupConfig::default(), |e| names.push(e.name()))
            .await
            .unwrap();

        assert_eq!(names.len(), 300 + 1 + 299);
        assert_eq!(names[300], "ready");
        assert_eq!(names.iter().filter(|n| **n == "member-added").count(), 300);
        assert_eq!(names.iter().filter(|n| **n == "member-removed").count(), 299);
        assert_eq!(summary.snapshot.members.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_contact_in_step_fails() {
        let mut scenario = scenario();
        scenario.steps = vec![Step::AddMembers {
            handles: vec![Handle(42)],
            message: String::new(),
        }];

        assert!(replay(scenario, GroupConfig::default(), |_| {}).await.is_err());
    }
}
