//! Local membership model
//!
//! [`Membership`] holds the reconciled view of a group: full members, local
//! pending contacts (with their [`PendingInfo`]) and remote pending
//! contacts. It is plain synchronous state; [`Membership::apply`] folds one
//! resolved `MembersChanged` batch into it and returns the events the
//! transition produced.
//!
//! A handle is in at most one of the three sets at any time.

use crate::metrics::record_counter;
use crate::tp_group::events::GroupEvent;
use crate::tp_group::types::{ChangeReason, Contact, Handle, Invitation, PendingInfo};
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

/// A `MembersChanged` batch whose handles were resolved to contacts
///
/// Handles the resolver did not know are already dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedBatch {
    pub message: Option<String>,
    pub added: Vec<Contact>,
    pub removed: Vec<Contact>,
    pub local_pending: Vec<Contact>,
    pub remote_pending: Vec<Contact>,
    pub actor: Option<Contact>,
    pub reason: ChangeReason,
}

impl ResolvedBatch {
    /// Empty batch carrying the given actor, reason and message
    pub fn new(actor: Option<Contact>, reason: ChangeReason, message: Option<String>) -> Self {
        Self {
            message,
            actor,
            reason,
            ..Default::default()
        }
    }

    pub fn with_added(mut self, contacts: Vec<Contact>) -> Self {
        self.added = contacts;
        self
    }

    pub fn with_removed(mut self, contacts: Vec<Contact>) -> Self {
        self.removed = contacts;
        self
    }

    pub fn with_local_pending(mut self, contacts: Vec<Contact>) -> Self {
        self.local_pending = contacts;
        self
    }

    pub fn with_remote_pending(mut self, contacts: Vec<Contact>) -> Self {
        self.remote_pending = contacts;
        self
    }
}

/// Serializable copy of the three membership sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    pub members: Vec<Contact>,
    pub local_pending: Vec<PendingInfo>,
    pub remote_pending: Vec<Contact>,
}

impl MembershipSnapshot {
    /// Total number of contacts across all sets
    pub fn len(&self) -> usize {
        self.members.len() + self.local_pending.len() + self.remote_pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reconciled group membership
#[derive(Debug, Clone, Default)]
pub struct Membership {
    self_handle: Option<Handle>,
    self_contact: Option<Contact>,
    members: LinkedHashMap<Handle, Contact>,
    local_pending: LinkedHashMap<Handle, PendingInfo>,
    remote_pending: LinkedHashMap<Handle, Contact>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the local user's handle; the zero handle means unknown
    pub fn set_self_handle(&mut self, handle: Handle) {
        self.self_handle = if handle.is_none() { None } else { Some(handle) };
        if self.self_contact.as_ref().map(Contact::handle) != self.self_handle {
            self.self_contact = None;
        }
    }

    /// Record the local user's contact for this group
    pub fn set_self_contact(&mut self, mut contact: Contact) {
        contact.set_is_user(true);
        self.self_handle = Some(contact.handle());
        self.self_contact = Some(contact);
    }

    pub fn self_contact(&self) -> Option<&Contact> {
        self.self_contact.as_ref()
    }

    pub fn self_handle(&self) -> Option<Handle> {
        self.self_handle
    }

    /// Fold one batch into the model
    ///
    /// Lists are processed in the fixed order added, removed, local pending,
    /// remote pending. A handle named by several lists of the same batch is
    /// taken by the first one only, so a contact both added and removed ends
    /// up a member. Events are returned in the order the transitions happen.
    pub fn apply(&mut self, batch: ResolvedBatch) -> Vec<GroupEvent> {
        let ResolvedBatch {
            message,
            added,
            removed,
            local_pending,
            remote_pending,
            actor,
            reason,
        } = batch;

        let actor = actor.map(|a| self.tag(a));
        let mut claimed: HashSet<Handle> = HashSet::new();
        let mut events = Vec::new();

        for contact in added {
            let contact = self.tag(contact);
            let handle = contact.handle();
            if !claimed.insert(handle) {
                continue;
            }

            // An invitation is resolved by membership
            self.local_pending.remove(&handle);
            self.remote_pending.remove(&handle);

            if !self.members.contains_key(&handle) {
                self.members.insert(handle, contact.clone());
                events.push(GroupEvent::MemberAdded {
                    contact,
                    actor: actor.clone(),
                    reason,
                    message: message.clone(),
                });
            }
        }

        for contact in removed {
            let contact = self.tag(contact);
            let handle = contact.handle();
            if !claimed.insert(handle) {
                trace!(%handle, "Handle both added and removed in one batch, keeping it");
                continue;
            }

            self.local_pending.remove(&handle);
            self.remote_pending.remove(&handle);

            if self.members.remove(&handle).is_some() {
                events.push(GroupEvent::MemberRemoved {
                    contact,
                    actor: actor.clone(),
                    reason,
                    message: message.clone(),
                });
            }
        }

        for contact in local_pending {
            let contact = self.tag(contact);
            let handle = contact.handle();
            if !claimed.insert(handle) || self.local_pending.contains_key(&handle) {
                continue;
            }

            self.remote_pending.remove(&handle);
            if let Some(previous) = self.members.remove(&handle) {
                events.push(GroupEvent::MemberRemoved {
                    contact: previous,
                    actor: actor.clone(),
                    reason,
                    message: message.clone(),
                });
            }

            self.local_pending.insert(
                handle,
                PendingInfo::new(contact.clone(), actor.clone(), reason, message.clone()),
            );
            events.push(GroupEvent::LocalPending {
                contact,
                actor: actor.clone(),
                reason,
                message: message.clone(),
            });
        }

        for contact in remote_pending {
            let contact = self.tag(contact);
            let handle = contact.handle();
            if !claimed.insert(handle) || self.remote_pending.contains_key(&handle) {
                continue;
            }

            self.local_pending.remove(&handle);
            if let Some(previous) = self.members.remove(&handle) {
                events.push(GroupEvent::MemberRemoved {
                    contact: previous,
                    actor: actor.clone(),
                    reason,
                    message: message.clone(),
                });
            }

            self.remote_pending.insert(handle, contact.clone());
            events.push(GroupEvent::RemotePending {
                contact,
                actor: actor.clone(),
                reason,
                message: message.clone(),
            });
        }

        record_counter("group.batches.applied", 1);
        events
    }

    /// Flag the local user's contact
    fn tag(&self, mut contact: Contact) -> Contact {
        let is_user = self.self_handle() == Some(contact.handle());
        contact.set_is_user(is_user);
        contact
    }

    pub fn members(&self) -> Vec<Contact> {
        self.members.values().cloned().collect()
    }

    pub fn local_pendings(&self) -> Vec<PendingInfo> {
        self.local_pending.values().cloned().collect()
    }

    pub fn remote_pendings(&self) -> Vec<Contact> {
        self.remote_pending.values().cloned().collect()
    }

    pub fn is_member(&self, handle: Handle) -> bool {
        self.members.contains_key(&handle)
    }

    pub fn is_local_pending(&self, handle: Handle) -> bool {
        self.local_pending.contains_key(&handle)
    }

    pub fn is_remote_pending(&self, handle: Handle) -> bool {
        self.remote_pending.contains_key(&handle)
    }

    /// Pending information for a local pending contact
    pub fn pending_info(&self, handle: Handle) -> Option<&PendingInfo> {
        self.local_pending.get(&handle)
    }

    /// Whether the handle is in any of the three sets
    pub fn contains(&self, handle: Handle) -> bool {
        self.is_member(handle) || self.is_local_pending(handle) || self.is_remote_pending(handle)
    }

    /// The invitation waiting for the local user, if any
    ///
    /// When the channel did not name who invited us, the first remote
    /// pending contact is assumed to be the inviter, then the first member.
    pub fn invitation(&self) -> Option<Invitation> {
        let handle = self.self_handle()?;
        let info = self.local_pending.get(&handle)?;

        let inviter = info
            .actor
            .clone()
            .or_else(|| self.remote_pending.values().next().cloned())
            .or_else(|| self.members.values().next().cloned());

        Some(Invitation {
            inviter,
            message: info.message.clone(),
            reason: info.reason,
        })
    }

    /// Every contact in any of the three sets
    pub fn contacts(&self) -> Vec<Contact> {
        self.members
            .values()
            .cloned()
            .chain(self.local_pending.values().map(|info| info.member.clone()))
            .chain(self.remote_pending.values().cloned())
            .collect()
    }

    pub fn snapshot(&self) -> MembershipSnapshot {
        MembershipSnapshot {
            members: self.members(),
            local_pending: self.local_pendings(),
            remote_pending: self.remote_pendings(),
        }
    }

    /// Drop every contact and pending record
    pub fn clear(&mut self) {
        self.members.clear();
        self.local_pending.clear();
        self.remote_pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(handle: u32) -> Contact {
        Contact::new(Handle(handle), format!("contact{}@example.com", handle))
    }

    fn added(handles: &[u32]) -> ResolvedBatch {
        ResolvedBatch::default().with_added(handles.iter().map(|h| contact(*h)).collect())
    }

    #[test]
    fn test_added_emits_once() {
        let mut membership = Membership::new();

        let events = membership.apply(added(&[1, 2]));
        assert_eq!(events.len(), 2);
        assert!(membership.is_member(Handle(1)));
        assert!(membership.is_member(Handle(2)));

        let events = membership.apply(added(&[1, 2]));
        assert!(events.is_empty());
        assert_eq!(membership.members().len(), 2);
    }

    #[test]
    fn test_removed_only_fires_for_members() {
        let mut membership = Membership::new();
        membership.apply(added(&[1]));

        let events = membership
            .apply(ResolvedBatch::default().with_removed(vec![contact(1), contact(9)]));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            GroupEvent::MemberRemoved { contact, .. } if contact.handle() == Handle(1)
        ));
        assert!(!membership.contains(Handle(1)));

        let events = membership.apply(ResolvedBatch::default().with_removed(vec![contact(1)]));
        assert!(events.is_empty());
    }

    #[test]
    fn test_local_pending_resolved_by_membership() {
        let mut membership = Membership::new();
        let batch =
            ResolvedBatch::new(Some(contact(2)), ChangeReason::Invited, Some("join?".into()))
                .with_local_pending(vec![contact(3)]);

        let events = membership.apply(batch);
        assert_eq!(events.len(), 1);
        let info = membership.pending_info(Handle(3)).unwrap();
        assert_eq!(info.actor, Some(contact(2)));
        assert_eq!(info.message.as_deref(), Some("join?"));

        let events = membership.apply(
            ResolvedBatch::new(Some(contact(3)), ChangeReason::None, None)
                .with_added(vec![contact(3)]),
        );
        assert_eq!(events.len(), 1);
        assert!(membership.is_member(Handle(3)));
        assert!(membership.pending_info(Handle(3)).is_none());
    }

    #[test]
    fn test_local_pending_not_recorded_twice() {
        let mut membership = Membership::new();
        let first =
            ResolvedBatch::new(Some(contact(2)), ChangeReason::Invited, Some("first".into()))
                .with_local_pending(vec![contact(3)]);
        let second =
            ResolvedBatch::new(Some(contact(4)), ChangeReason::Invited, Some("second".into()))
                .with_local_pending(vec![contact(3)]);

        assert_eq!(membership.apply(first).len(), 1);
        assert!(membership.apply(second).is_empty());
        assert_eq!(
            membership.pending_info(Handle(3)).unwrap().message.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_added_wins_over_removed_in_same_batch() {
        let mut membership = Membership::new();
        membership.apply(added(&[1]));

        let events = membership.apply(
            ResolvedBatch::default()
                .with_added(vec![contact(1), contact(2)])
                .with_removed(vec![contact(1), contact(2)]),
        );

        assert!(membership.is_member(Handle(1)));
        assert!(membership.is_member(Handle(2)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "member-added");
    }

    #[test]
    fn test_member_moving_to_pending_is_removed() {
        let mut membership = Membership::new();
        membership.apply(added(&[1]));

        let events =
            membership.apply(ResolvedBatch::default().with_remote_pending(vec![contact(1)]));

        let names: Vec<_> = events.iter().map(GroupEvent::name).collect();
        assert_eq!(names, vec!["member-removed", "remote-pending"]);
        assert!(!membership.is_member(Handle(1)));
        assert!(membership.is_remote_pending(Handle(1)));
    }

    #[test]
    fn test_remote_to_local_pending_moves() {
        let mut membership = Membership::new();
        membership.apply(ResolvedBatch::default().with_remote_pending(vec![contact(5)]));
        membership.apply(ResolvedBatch::default().with_local_pending(vec![contact(5)]));

        assert!(membership.is_local_pending(Handle(5)));
        assert!(!membership.is_remote_pending(Handle(5)));
    }

    #[test]
    fn test_self_contact_is_tagged() {
        let mut membership = Membership::new();
        membership.set_self_contact(contact(1));

        let events = membership.apply(added(&[1, 2]));
        assert!(events[0].contact().unwrap().is_user());
        assert!(!events[1].contact().unwrap().is_user());
        assert!(membership.members()[0].is_user());
    }

    #[test]
    fn test_self_handle_without_contact() {
        let mut membership = Membership::new();
        membership.set_self_handle(Handle(4));

        let events = membership.apply(added(&[4]));
        assert!(events[0].contact().unwrap().is_user());
        assert!(membership.self_contact().is_none());

        membership.set_self_handle(Handle::NONE);
        assert_eq!(membership.self_handle(), None);
    }

    #[test]
    fn test_invitation_uses_actor() {
        let mut membership = Membership::new();
        membership.set_self_contact(contact(1));
        membership.apply(added(&[2]));
        membership.apply(
            ResolvedBatch::new(Some(contact(3)), ChangeReason::Invited, Some("come".into()))
                .with_local_pending(vec![contact(1)]),
        );

        let invitation = membership.invitation().unwrap();
        assert_eq!(invitation.inviter, Some(contact(3)));
        assert_eq!(invitation.message.as_deref(), Some("come"));
        assert_eq!(invitation.reason, ChangeReason::Invited);
    }

    #[test]
    fn test_invitation_falls_back_to_first_member() {
        let mut membership = Membership::new();
        membership.set_self_contact(contact(1));
        membership.apply(added(&[7, 8]));
        membership.apply(ResolvedBatch::default().with_local_pending(vec![contact(1)]));

        assert_eq!(membership.invitation().unwrap().inviter, Some(contact(7)));

        membership.apply(ResolvedBatch::default().with_remote_pending(vec![contact(9)]));
        assert_eq!(membership.invitation().unwrap().inviter, Some(contact(9)));
    }

    #[test]
    fn test_no_invitation_for_other_contacts() {
        let mut membership = Membership::new();
        membership.set_self_contact(contact(1));
        membership.apply(added(&[1, 2]));
        membership.apply(ResolvedBatch::default().with_local_pending(vec![contact(3)]));

        assert!(membership.invitation().is_none());
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut membership = Membership::new();
        membership.apply(
            added(&[1])
                .with_local_pending(vec![contact(2)])
                .with_remote_pending(vec![contact(3)]),
        );
        assert_eq!(membership.snapshot().len(), 3);

        membership.clear();
        assert!(membership.snapshot().is_empty());
    }
}
