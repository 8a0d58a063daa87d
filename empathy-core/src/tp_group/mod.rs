//! Telepathy group membership for Empathy
//!
//! This module keeps a local, event-emitting mirror of a Telepathy channel's
//! Group interface:
//! - Full members, local pending and remote pending contacts
//! - Asynchronous bootstrap with retry
//! - Reconciliation of `MembersChanged` batches
//! - Membership requests forwarded to the channel
//!
//! ## Core Components
//!
//! - `TpGroup`: the synchronizer and its public API
//! - `Membership`: the synchronous state model and reconciliation algorithm
//! - `ChannelProxy` / `ContactResolver`: collaborator boundaries
//! - `GroupEventBroadcaster`: event fan-out to subscribers
//!
//! ## Invariants
//!
//! - A handle is in at most one of members, local pending, remote pending
//! - Reapplying a batch leaves the state unchanged and emits nothing
//! - No mutation is forwarded before the initial membership is applied

// Core types and errors
pub mod types;
pub mod errors;
pub mod events;

// Collaborator boundaries and in-memory implementations
pub mod proxy;
pub mod adapters;

// State model and synchronizer
pub mod membership;
pub mod group;

pub use errors::{GroupError, GroupResult, ProxyError, ProxyResult};
pub use events::{GroupEvent, GroupEventBroadcaster};
pub use group::{GroupState, TpGroup};
pub use membership::{Membership, MembershipSnapshot, ResolvedBatch};
pub use proxy::{ChannelProxy, ChannelSignal, ContactResolver};
pub use types::{
    ChangeReason, ChannelRef, Contact, Handle, HandleType, Invitation, LocalPendingInfo,
    MembersChanged, PendingInfo,
};
