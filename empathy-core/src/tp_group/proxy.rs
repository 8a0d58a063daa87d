//! Channel and contact collaborators
//!
//! A group never talks to D-Bus itself. It is handed a [`ChannelProxy`] for
//! the channel's Group interface and a [`ContactResolver`] that turns
//! handles into contacts, and it owns nothing else.
//!
//! ```text
//! TpGroup
//!    |
//!    +---> ChannelProxy (trait)
//!    |        +---> telepathy binding (application)
//!    |        +---> MockChannelProxy (tests, replay)
//!    |
//!    +---> ContactResolver (trait)
//! ```

use crate::tp_group::errors::ProxyResult;
use crate::tp_group::types::{
    ChannelRef, Contact, Handle, HandleType, LocalPendingInfo, MembersChanged,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Notifications pushed by the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum ChannelSignal {
    /// The Group interface's `MembersChanged` signal
    MembersChanged(MembersChanged),

    /// The channel was closed or its connection went away
    Invalidated { reason: String },
}

/// Asynchronous view of a channel implementing the Group interface
#[async_trait]
pub trait ChannelProxy: Send + Sync {
    /// Channel this proxy is bound to
    fn channel(&self) -> &ChannelRef;

    /// Subscribe to the channel's signals
    ///
    /// Signals are delivered in the order the channel emitted them. Only
    /// signals emitted after the call are seen by the returned receiver.
    fn signals(&self) -> broadcast::Receiver<ChannelSignal>;

    /// Our own handle in this group
    async fn get_self_handle(&self) -> ProxyResult<Handle>;

    /// Current full members
    async fn get_members(&self) -> ProxyResult<Vec<Handle>>;

    /// Contacts awaiting local approval, with who invited them and why
    async fn get_local_pending_members_with_info(&self) -> ProxyResult<Vec<LocalPendingInfo>>;

    /// Contacts we invited who have not answered yet
    async fn get_remote_pending_members(&self) -> ProxyResult<Vec<Handle>>;

    /// Map handles of the given type to their string identifiers
    async fn inspect_handles(
        &self,
        handle_type: HandleType,
        handles: &[Handle],
    ) -> ProxyResult<Vec<String>>;

    /// Ask the channel to add (or accept) the given handles
    async fn add_members(&self, handles: &[Handle], message: &str) -> ProxyResult<()>;

    /// Ask the channel to remove (or reject) the given handles
    async fn remove_members(&self, handles: &[Handle], message: &str) -> ProxyResult<()>;

    /// Close the channel
    async fn close(&self) -> ProxyResult<()>;
}

/// Maps handles on the group's connection to contacts
#[async_trait]
pub trait ContactResolver: Send + Sync {
    /// Resolve a single handle, `None` if the connection does not know it
    async fn resolve(&self, handle: Handle) -> Option<Contact>;

    /// Resolve several handles, preserving order
    async fn resolve_many(&self, handles: &[Handle]) -> Vec<Option<Contact>> {
        let mut contacts = Vec::with_capacity(handles.len());
        for handle in handles {
            contacts.push(self.resolve(*handle).await);
        }
        contacts
    }
}
