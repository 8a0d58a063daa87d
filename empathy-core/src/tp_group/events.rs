//! Group Events
//!
//! Events emitted by a group for consumption by the chat and contact list
//! layers.

use crate::tp_group::types::{ChangeReason, Contact};
use serde::{Deserialize, Serialize};

mod broadcaster;

pub use broadcaster::GroupEventBroadcaster;

/// Group event type
///
/// The four membership kinds all carry the contact whose state changed, the
/// actor responsible (if the channel named one), the reason code and the
/// optional message attached to the change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GroupEvent {
    /// A contact became a member
    MemberAdded {
        contact: Contact,
        actor: Option<Contact>,
        reason: ChangeReason,
        message: Option<String>,
    },

    /// A contact stopped being a member
    MemberRemoved {
        contact: Contact,
        actor: Option<Contact>,
        reason: ChangeReason,
        message: Option<String>,
    },

    /// A contact is waiting for local approval
    LocalPending {
        contact: Contact,
        actor: Option<Contact>,
        reason: ChangeReason,
        message: Option<String>,
    },

    /// A contact was invited and is waiting to accept
    RemotePending {
        contact: Contact,
        actor: Option<Contact>,
        reason: ChangeReason,
        message: Option<String>,
    },

    /// Initial membership has been applied; fires once per bootstrap
    Ready,

    /// Bootstrap gave up after exhausting its retries
    BootstrapFailed { error: String },

    /// The group was torn down
    Destroyed,
}

impl GroupEvent {
    /// The contact whose membership changed, for the four membership kinds
    pub fn contact(&self) -> Option<&Contact> {
        match self {
            GroupEvent::MemberAdded { contact, .. }
            | GroupEvent::MemberRemoved { contact, .. }
            | GroupEvent::LocalPending { contact, .. }
            | GroupEvent::RemotePending { contact, .. } => Some(contact),
            _ => None,
        }
    }

    /// The actor of the change, if there is one
    pub fn actor(&self) -> Option<&Contact> {
        match self {
            GroupEvent::MemberAdded { actor, .. }
            | GroupEvent::MemberRemoved { actor, .. }
            | GroupEvent::LocalPending { actor, .. }
            | GroupEvent::RemotePending { actor, .. } => actor.as_ref(),
            _ => None,
        }
    }

    /// The message attached to the change, if there is one
    pub fn message(&self) -> Option<&str> {
        match self {
            GroupEvent::MemberAdded { message, .. }
            | GroupEvent::MemberRemoved { message, .. }
            | GroupEvent::LocalPending { message, .. }
            | GroupEvent::RemotePending { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Stable signal-style name of the event
    pub fn name(&self) -> &'static str {
        match self {
            GroupEvent::MemberAdded { .. } => "member-added",
            GroupEvent::MemberRemoved { .. } => "member-removed",
            GroupEvent::LocalPending { .. } => "local-pending",
            GroupEvent::RemotePending { .. } => "remote-pending",
            GroupEvent::Ready => "ready",
            GroupEvent::BootstrapFailed { .. } => "bootstrap-failed",
            GroupEvent::Destroyed => "destroyed",
        }
    }

    /// Check if this is one of the four membership change kinds
    pub fn is_membership_change(&self) -> bool {
        self.contact().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tp_group::types::Handle;

    #[test]
    fn test_event_accessors() {
        let event = GroupEvent::LocalPending {
            contact: Contact::new(Handle(3), "carol@example.com"),
            actor: Some(Contact::new(Handle(2), "bob@example.com")),
            reason: ChangeReason::Invited,
            message: Some("join?".to_string()),
        };

        assert_eq!(event.contact().map(|c| c.handle()), Some(Handle(3)));
        assert_eq!(event.actor().map(|c| c.handle()), Some(Handle(2)));
        assert_eq!(event.message(), Some("join?"));
        assert_eq!(event.name(), "local-pending");
        assert!(event.is_membership_change());
    }

    #[test]
    fn test_lifecycle_events_have_no_payload() {
        assert!(GroupEvent::Ready.contact().is_none());
        assert!(GroupEvent::Destroyed.actor().is_none());
        assert!(!GroupEvent::Ready.is_membership_change());
        assert_eq!(GroupEvent::Destroyed.name(), "destroyed");
    }

    #[test]
    fn test_event_serialization() {
        let event = GroupEvent::MemberRemoved {
            contact: Contact::new(Handle(2), "bob@example.com"),
            actor: None,
            reason: ChangeReason::Kicked,
            message: Some("bye".to_string()),
        };

        let serialized = serde_json::to_string(&event).unwrap();
        assert!(serialized.contains("\"event\":\"member-removed\""));

        let deserialized: GroupEvent = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, event);
    }
}
