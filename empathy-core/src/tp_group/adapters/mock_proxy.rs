//! In-memory channel and contact resolver
//!
//! Behaves like a connection manager holding one group channel: it answers
//! the bootstrap queries from its own lists, records add/remove requests and
//! emits `MembersChanged` when told to. Used by tests and by the replay CLI.

use crate::tp_group::{
    errors::{ProxyError, ProxyResult},
    proxy::{ChannelProxy, ChannelSignal, ContactResolver},
    types::{ChannelRef, Contact, Handle, HandleType, LocalPendingInfo, MembersChanged},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

/// Proxy calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockCall {
    SelfHandle,
    Members,
    LocalPending,
    RemotePending,
    InspectHandles,
    AddMembers,
    RemoveMembers,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Add,
    Remove,
}

/// An add or remove request received by the mock channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRequest {
    pub kind: RequestKind,
    pub handles: Vec<Handle>,
    pub message: String,
}

#[derive(Default)]
struct MockChannelState {
    self_handle: Handle,
    members: Vec<Handle>,
    local_pending: Vec<LocalPendingInfo>,
    remote_pending: Vec<Handle>,
    names: HashMap<Handle, String>,
    failures: HashMap<MockCall, u32>,
    requests: Vec<MemberRequest>,
    calls: HashMap<MockCall, u32>,
    members_gate: Option<Arc<Notify>>,
    echo_requests: bool,
    closed: bool,
}

impl MockChannelState {
    /// Count the call and consume one injected failure for it, if any
    fn check(&mut self, call: MockCall) -> ProxyResult<()> {
        *self.calls.entry(call).or_insert(0) += 1;

        if self.closed {
            return Err(ProxyError::Disconnected);
        }

        match self.failures.get_mut(&call) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(ProxyError::dbus(
                    "org.freedesktop.Telepathy.Error.NetworkError",
                    format!("injected failure for {:?}", call),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Update the server-side lists the way the batch describes
    fn apply(&mut self, batch: &MembersChanged) {
        let touched: Vec<Handle> = batch
            .added
            .iter()
            .chain(&batch.removed)
            .chain(&batch.local_pending)
            .chain(&batch.remote_pending)
            .copied()
            .collect();

        self.members.retain(|h| !touched.contains(h));
        self.local_pending.retain(|info| !touched.contains(&info.member));
        self.remote_pending.retain(|h| !touched.contains(h));

        self.members.extend(batch.added.iter().copied());
        self.local_pending.extend(batch.local_pending.iter().map(|h| LocalPendingInfo {
            member: *h,
            actor: batch.actor,
            reason: batch.reason,
            message: batch.message.clone(),
        }));
        self.remote_pending.extend(batch.remote_pending.iter().copied());
    }
}

/// Mock group channel
pub struct MockChannelProxy {
    channel: ChannelRef,
    state: Arc<Mutex<MockChannelState>>,
    signals: broadcast::Sender<ChannelSignal>,
}

impl MockChannelProxy {
    /// Create a mock channel with no members
    pub fn new(channel: ChannelRef) -> Self {
        let (signals, _rx) = broadcast::channel(1024);
        Self {
            channel,
            state: Arc::new(Mutex::new(MockChannelState::default())),
            signals,
        }
    }

    /// Set our own handle on the channel
    pub fn with_self_handle(self, handle: Handle) -> Self {
        self.lock().self_handle = handle;
        self
    }

    pub fn with_members(self, members: Vec<Handle>) -> Self {
        self.lock().members = members;
        self
    }

    pub fn with_local_pending(self, local_pending: Vec<LocalPendingInfo>) -> Self {
        self.lock().local_pending = local_pending;
        self
    }

    pub fn with_remote_pending(self, remote_pending: Vec<Handle>) -> Self {
        self.lock().remote_pending = remote_pending;
        self
    }

    /// Register the identifier returned by `inspect_handles` for a handle
    pub fn with_name(self, handle: Handle, name: impl Into<String>) -> Self {
        self.lock().names.insert(handle, name.into());
        self
    }

    /// Answer add/remove requests by emitting the matching `MembersChanged`
    pub fn with_echo(self, enabled: bool) -> Self {
        self.lock().echo_requests = enabled;
        self
    }

    /// Make the next `times` calls of `call` fail
    pub fn fail_next(&self, call: MockCall, times: u32) {
        self.lock().failures.insert(call, times);
    }

    /// Block `get_members` until the returned gate is notified
    pub fn hold_members(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().members_gate = Some(gate.clone());
        gate
    }

    /// Emit a `MembersChanged` signal, updating the channel's own lists
    ///
    /// # Returns
    /// Number of subscribers that received it
    pub fn members_changed(&self, batch: MembersChanged) -> usize {
        self.lock().apply(&batch);
        self.signals
            .send(ChannelSignal::MembersChanged(batch))
            .unwrap_or(0)
    }

    /// Update the channel's lists without emitting a signal
    pub fn record(&self, batch: &MembersChanged) {
        self.lock().apply(batch);
    }

    /// Emit a signal without touching the channel's lists
    pub fn emit(&self, signal: ChannelSignal) -> usize {
        self.signals.send(signal).unwrap_or(0)
    }

    /// Invalidate the channel
    pub fn invalidate(&self, reason: impl Into<String>) -> usize {
        self.lock().closed = true;
        self.signals
            .send(ChannelSignal::Invalidated {
                reason: reason.into(),
            })
            .unwrap_or(0)
    }

    /// Add/remove requests received so far
    pub fn requests(&self) -> Vec<MemberRequest> {
        self.lock().requests.clone()
    }

    /// How many times `call` was made, failed attempts included
    pub fn call_count(&self, call: MockCall) -> u32 {
        self.lock().calls.get(&call).copied().unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockChannelState> {
        // A poisoned lock only means a test panicked while holding it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request(&self, kind: RequestKind, handles: &[Handle], message: &str) -> ProxyResult<()> {
        let echo = {
            let mut state = self.lock();
            state.check(match kind {
                RequestKind::Add => MockCall::AddMembers,
                RequestKind::Remove => MockCall::RemoveMembers,
            })?;
            state.requests.push(MemberRequest {
                kind,
                handles: handles.to_vec(),
                message: message.to_string(),
            });
            state.echo_requests
        };

        if echo {
            let mut batch = MembersChanged {
                message: message.to_string(),
                actor: self.lock().self_handle,
                ..Default::default()
            };
            match kind {
                RequestKind::Add => batch.added = handles.to_vec(),
                RequestKind::Remove => batch.removed = handles.to_vec(),
            }
            self.members_changed(batch);
        }

        Ok(())
    }
}

#[async_trait]
impl ChannelProxy for MockChannelProxy {
    fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    fn signals(&self) -> broadcast::Receiver<ChannelSignal> {
        self.signals.subscribe()
    }

    async fn get_self_handle(&self) -> ProxyResult<Handle> {
        let mut state = self.lock();
        state.check(MockCall::SelfHandle)?;
        Ok(state.self_handle)
    }

    async fn get_members(&self) -> ProxyResult<Vec<Handle>> {
        let gate = self.lock().members_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.lock();
        state.check(MockCall::Members)?;
        Ok(state.members.clone())
    }

    async fn get_local_pending_members_with_info(&self) -> ProxyResult<Vec<LocalPendingInfo>> {
        let mut state = self.lock();
        state.check(MockCall::LocalPending)?;
        Ok(state.local_pending.clone())
    }

    async fn get_remote_pending_members(&self) -> ProxyResult<Vec<Handle>> {
        let mut state = self.lock();
        state.check(MockCall::RemotePending)?;
        Ok(state.remote_pending.clone())
    }

    async fn inspect_handles(
        &self,
        _handle_type: HandleType,
        handles: &[Handle],
    ) -> ProxyResult<Vec<String>> {
        let mut state = self.lock();
        state.check(MockCall::InspectHandles)?;
        handles
            .iter()
            .map(|h| {
                state.names.get(h).cloned().ok_or_else(|| {
                    ProxyError::dbus(
                        "org.freedesktop.Telepathy.Error.InvalidHandle",
                        format!("unknown handle {}", h),
                    )
                })
            })
            .collect()
    }

    async fn add_members(&self, handles: &[Handle], message: &str) -> ProxyResult<()> {
        self.request(RequestKind::Add, handles, message)
    }

    async fn remove_members(&self, handles: &[Handle], message: &str) -> ProxyResult<()> {
        self.request(RequestKind::Remove, handles, message)
    }

    async fn close(&self) -> ProxyResult<()> {
        self.lock().check(MockCall::Close)?;
        self.invalidate("closed");
        Ok(())
    }
}

/// Contact resolver backed by a fixed table
#[derive(Default)]
pub struct MockContactResolver {
    contacts: Mutex<HashMap<Handle, Contact>>,
}

impl MockContactResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver knowing exactly the given contacts
    pub fn with_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let resolver = Self::new();
        for contact in contacts {
            resolver.insert(contact);
        }
        resolver
    }

    pub fn insert(&self, contact: Contact) {
        self.contacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(contact.handle(), contact);
    }
}

#[async_trait]
impl ContactResolver for MockContactResolver {
    async fn resolve(&self, handle: Handle) -> Option<Contact> {
        self.contacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&handle)
            .cloned()
    }
}
