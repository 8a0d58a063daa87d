//! Group membership synchronizer
//!
//! [`TpGroup`] mirrors the membership of one channel implementing the
//! Telepathy Group interface. It fetches the initial state, folds every
//! `MembersChanged` batch into a local [`Membership`] model and publishes
//! the resulting [`GroupEvent`]s to subscribers.
//!
//! ## Lifecycle
//!
//! ```text
//!                initialize()
//! Uninitialized ─────────────> Bootstrapping ──────> Ready
//!       ^                            │                 │
//!       └──── retries exhausted ─────┘                 │ Invalidated / destroy()
//!                                                      v
//!                                                  Destroyed
//! ```
//!
//! The background task subscribes to the channel's signals before the first
//! fetch. Batches that arrive while bootstrapping are kept in the broadcast
//! queue and applied, in order, once the initial snapshot is in place.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let group = TpGroup::new(proxy, resolver, GroupConfig::default())?;
//! let mut events = group.subscribe();
//!
//! group.initialize()?;
//! group.wait_ready().await?;
//!
//! group.add_member(&contact, "Join us").await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.name());
//! }
//! ```

use crate::config::GroupConfig;
use crate::metrics::{record_counter, Timer};
use crate::tp_group::errors::{GroupError, GroupResult, ProxyError, ProxyResult};
use crate::tp_group::events::{GroupEvent, GroupEventBroadcaster};
use crate::tp_group::membership::{Membership, MembershipSnapshot, ResolvedBatch};
use crate::tp_group::proxy::{ChannelProxy, ChannelSignal, ContactResolver};
use crate::tp_group::types::{
    non_empty, ChannelRef, Contact, Handle, HandleType, Invitation, LocalPendingInfo,
    MembersChanged, PendingInfo,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle state of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    /// Created, or a previous bootstrap gave up
    Uninitialized,
    /// Initial membership is being fetched
    Bootstrapping,
    /// Initial membership applied; mutations are allowed
    Ready,
    /// Channel invalidated or group torn down; terminal
    Destroyed,
}

impl std::fmt::Display for GroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GroupState::Uninitialized => "uninitialized",
            GroupState::Bootstrapping => "bootstrapping",
            GroupState::Ready => "ready",
            GroupState::Destroyed => "destroyed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
struct Lifecycle {
    state: GroupState,
    last_error: Option<ProxyError>,
}

struct Inner {
    membership: Membership,
    name: Option<String>,
}

/// Raw membership as reported by the channel
struct ChannelMembers {
    self_handle: Handle,
    members: Vec<Handle>,
    local_pending: Vec<LocalPendingInfo>,
    remote_pending: Vec<Handle>,
}

impl ChannelMembers {
    fn handles(&self) -> HashSet<Handle> {
        self.members
            .iter()
            .copied()
            .chain(self.local_pending.iter().map(|info| info.member))
            .chain(self.remote_pending.iter().copied())
            .collect()
    }
}

/// State shared with the background task
struct Shared {
    proxy: Arc<dyn ChannelProxy>,
    resolver: Arc<dyn ContactResolver>,
    config: GroupConfig,
    inner: RwLock<Inner>,
    /// Serializes reconciliation so batches apply in the order they are fed
    reconcile: tokio::sync::Mutex<()>,
    /// Lifecycle transitions happen with `inner` write-locked
    lifecycle: watch::Sender<Lifecycle>,
    events: GroupEventBroadcaster,
}

/// Membership synchronizer for one group channel
pub struct TpGroup {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TpGroup {
    /// Create a group bound to a channel proxy and a contact resolver
    ///
    /// Nothing is fetched until [`TpGroup::initialize`] is called.
    pub fn new(
        proxy: Arc<dyn ChannelProxy>,
        resolver: Arc<dyn ContactResolver>,
        config: GroupConfig,
    ) -> GroupResult<Self> {
        config.validate()?;

        let (lifecycle, _rx) = watch::channel(Lifecycle {
            state: GroupState::Uninitialized,
            last_error: None,
        });
        let events = GroupEventBroadcaster::new(config.event_capacity);

        Ok(Self {
            shared: Arc::new(Shared {
                proxy,
                resolver,
                config,
                inner: RwLock::new(Inner {
                    membership: Membership::new(),
                    name: None,
                }),
                reconcile: tokio::sync::Mutex::new(()),
                lifecycle,
                events,
            }),
            task: Mutex::new(None),
        })
    }

    /// Start the asynchronous bootstrap
    ///
    /// Returns immediately; use [`TpGroup::wait_ready`] or the `Ready` event
    /// to learn the outcome. Calling it while bootstrapping or ready is a
    /// no-op, and after a failed bootstrap it starts a new attempt.
    ///
    /// # Errors
    /// `Destroyed` once the group has been torn down.
    pub fn initialize(&self) -> GroupResult<()> {
        let mut current = GroupState::Uninitialized;
        let started = self.shared.lifecycle.send_if_modified(|lifecycle| {
            current = lifecycle.state;
            if lifecycle.state == GroupState::Uninitialized {
                lifecycle.state = GroupState::Bootstrapping;
                lifecycle.last_error = None;
                true
            } else {
                false
            }
        });

        if !started {
            return match current {
                GroupState::Destroyed => Err(GroupError::Destroyed),
                _ => Ok(()),
            };
        }

        info!(channel = %self.channel(), "Bootstrapping group");

        let signals = self.shared.proxy.signals();
        let task = tokio::spawn(run(Arc::downgrade(&self.shared), signals));
        if let Some(previous) = self.task_slot().replace(task) {
            previous.abort();
        }

        Ok(())
    }

    /// Wait for the current bootstrap to finish
    ///
    /// # Errors
    /// - `NotReady` if no bootstrap was started
    /// - `Proxy` if the last bootstrap gave up
    /// - `Destroyed` if the group was torn down
    pub async fn wait_ready(&self) -> GroupResult<()> {
        let mut rx = self.shared.lifecycle.subscribe();
        loop {
            {
                let lifecycle = rx.borrow_and_update();
                match lifecycle.state {
                    GroupState::Ready => return Ok(()),
                    GroupState::Destroyed => return Err(GroupError::Destroyed),
                    GroupState::Uninitialized => {
                        return Err(match &lifecycle.last_error {
                            Some(error) => GroupError::Proxy(error.clone()),
                            None => GroupError::NotReady,
                        })
                    }
                    GroupState::Bootstrapping => {}
                }
            }

            if rx.changed().await.is_err() {
                return Err(GroupError::Destroyed);
            }
        }
    }

    /// Fold one `MembersChanged` batch into the group
    ///
    /// Handles the resolver does not know are skipped; the rest of the batch
    /// is applied. Batches fed while the group is not ready are ignored.
    ///
    /// # Returns
    /// The events the batch produced, already published to subscribers
    pub async fn apply_update(&self, batch: MembersChanged) -> Vec<GroupEvent> {
        self.shared.apply_update(batch).await
    }

    /// Ask the channel to add contacts
    ///
    /// Local state only changes when the channel reports the change back.
    pub async fn add_members(&self, contacts: &[Contact], message: &str) -> GroupResult<()> {
        self.ensure_ready()?;

        let handles = handles_of(contacts);
        debug!(channel = %self.channel(), count = handles.len(), "Adding members");

        self.shared
            .proxy
            .add_members(&handles, message)
            .await
            .map_err(|e| {
                warn!(channel = %self.channel(), error = %e, "Failed to add members");
                GroupError::from(e)
            })
    }

    pub async fn add_member(&self, contact: &Contact, message: &str) -> GroupResult<()> {
        self.add_members(std::slice::from_ref(contact), message).await
    }

    /// Ask the channel to remove contacts
    pub async fn remove_members(&self, contacts: &[Contact], message: &str) -> GroupResult<()> {
        self.ensure_ready()?;

        let handles = handles_of(contacts);
        debug!(channel = %self.channel(), count = handles.len(), "Removing members");

        self.shared
            .proxy
            .remove_members(&handles, message)
            .await
            .map_err(|e| {
                warn!(channel = %self.channel(), error = %e, "Failed to remove members");
                GroupError::from(e)
            })
    }

    pub async fn remove_member(&self, contact: &Contact, message: &str) -> GroupResult<()> {
        self.remove_members(std::slice::from_ref(contact), message).await
    }

    /// The invitation waiting for the local user, if any
    pub async fn get_invitation(&self) -> Option<Invitation> {
        self.shared.inner.read().await.membership.invitation()
    }

    /// Accept a pending invitation by adding ourselves to the group
    pub async fn accept_invitation(&self) -> GroupResult<()> {
        self.ensure_ready()?;

        let handle = self.self_handle().await.ok_or(GroupError::NotReady)?;
        info!(channel = %self.channel(), %handle, "Accepting invitation");

        self.shared
            .proxy
            .add_members(&[handle], "")
            .await
            .map_err(|e| {
                warn!(channel = %self.channel(), error = %e, "Failed to accept invitation");
                GroupError::from(e)
            })
    }

    /// Ask the channel to close
    ///
    /// The group is destroyed when the channel reports its invalidation.
    pub async fn close(&self) -> GroupResult<()> {
        self.ensure_ready()?;

        info!(channel = %self.channel(), "Closing channel");
        self.shared.proxy.close().await.map_err(|e| {
            warn!(channel = %self.channel(), error = %e, "Failed to close channel");
            GroupError::from(e)
        })
    }

    /// Tear the group down and stop following the channel
    pub async fn destroy(&self) {
        self.shared.destroy("destroyed by owner").await;
        if let Some(task) = self.task_slot().take() {
            task.abort();
        }
    }

    /// Display name of the group's target
    ///
    /// Taken from the bootstrap when available, otherwise looked up through
    /// the proxy and cached. `None` for channels without a target handle.
    pub async fn name(&self) -> GroupResult<Option<String>> {
        if let Some(name) = self.shared.inner.read().await.name.clone() {
            return Ok(Some(name));
        }

        let name = fetch_name(self.shared.proxy.as_ref()).await.map_err(|e| {
            warn!(channel = %self.channel(), error = %e, "Failed to inspect group handle");
            GroupError::from(e)
        })?;

        if let Some(name) = &name {
            self.shared.inner.write().await.name = Some(name.clone());
        }
        Ok(name)
    }

    pub fn state(&self) -> GroupState {
        self.shared.state()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == GroupState::Ready
    }

    pub async fn self_handle(&self) -> Option<Handle> {
        self.shared.inner.read().await.membership.self_handle()
    }

    pub async fn self_contact(&self) -> Option<Contact> {
        self.shared.inner.read().await.membership.self_contact().cloned()
    }

    pub async fn members(&self) -> Vec<Contact> {
        self.shared.inner.read().await.membership.members()
    }

    pub async fn local_pendings(&self) -> Vec<PendingInfo> {
        self.shared.inner.read().await.membership.local_pendings()
    }

    pub async fn remote_pendings(&self) -> Vec<Contact> {
        self.shared.inner.read().await.membership.remote_pendings()
    }

    pub async fn is_member(&self, handle: Handle) -> bool {
        self.shared.inner.read().await.membership.is_member(handle)
    }

    /// Copy of the three membership sets
    pub async fn snapshot(&self) -> MembershipSnapshot {
        self.shared.inner.read().await.membership.snapshot()
    }

    pub fn channel(&self) -> &ChannelRef {
        self.shared.proxy.channel()
    }

    pub fn object_path(&self) -> &str {
        &self.channel().object_path
    }

    /// Subscribe to group events
    ///
    /// Each receiver buffers up to `event_capacity` events. The initial
    /// snapshot arrives as one burst with an event per contact in the room,
    /// so receivers that fall further behind observe `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<GroupEvent> {
        self.shared.events.subscribe()
    }

    pub fn config(&self) -> &GroupConfig {
        &self.shared.config
    }

    fn ensure_ready(&self) -> GroupResult<()> {
        match self.state() {
            GroupState::Ready => Ok(()),
            GroupState::Destroyed => Err(GroupError::Destroyed),
            GroupState::Uninitialized | GroupState::Bootstrapping => Err(GroupError::NotReady),
        }
    }

    fn task_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for TpGroup {
    fn drop(&mut self) {
        if let Some(task) = self.task_slot().take() {
            task.abort();
        }

        let destroyed = self.shared.lifecycle.send_if_modified(|lifecycle| {
            if lifecycle.state == GroupState::Destroyed {
                false
            } else {
                lifecycle.state = GroupState::Destroyed;
                true
            }
        });
        if destroyed {
            debug!(channel = %self.shared.proxy.channel(), "Group dropped");
            self.shared.events.emit(GroupEvent::Destroyed);
        }
    }
}

impl Shared {
    fn state(&self) -> GroupState {
        self.lifecycle.borrow().state
    }

    fn set_state(&self, state: GroupState) {
        self.lifecycle.send_modify(|lifecycle| lifecycle.state = state);
    }

    async fn apply_update(&self, batch: MembersChanged) -> Vec<GroupEvent> {
        let channel = self.proxy.channel();
        if self.state() != GroupState::Ready {
            debug!(%channel, state = %self.state(), "Ignoring MembersChanged, group not ready");
            record_counter("group.batches.ignored", 1);
            return Vec::new();
        }

        let _order = self.reconcile.lock().await;
        let resolved = resolve_batch(self.resolver.as_ref(), &batch).await;

        let mut inner = self.inner.write().await;
        if self.state() != GroupState::Ready {
            return Vec::new();
        }

        let events = inner.membership.apply(resolved);
        debug!(%channel, events = events.len(), "Applied MembersChanged");
        self.events.emit_many(events.clone());
        events
    }

    async fn finish_bootstrap(
        &self,
        initial: &ChannelMembers,
        self_contact: Option<Contact>,
        name: Option<String>,
        batches: Vec<ResolvedBatch>,
    ) -> bool {
        let _order = self.reconcile.lock().await;
        let mut inner = self.inner.write().await;
        if self.state() != GroupState::Bootstrapping {
            return false;
        }

        inner.membership.set_self_handle(initial.self_handle);
        if let Some(contact) = self_contact {
            inner.membership.set_self_contact(contact);
        }
        if name.is_some() {
            inner.name = name;
        }

        let mut events = Vec::new();
        for batch in batches {
            events.extend(inner.membership.apply(batch));
        }
        self.events.emit_many(events);

        self.set_state(GroupState::Ready);
        self.events.emit(GroupEvent::Ready);

        info!(
            channel = %self.proxy.channel(),
            members = inner.membership.members().len(),
            local_pending = inner.membership.local_pendings().len(),
            remote_pending = inner.membership.remote_pendings().len(),
            "Group ready"
        );
        true
    }

    async fn fail_bootstrap(&self, error: ProxyError) {
        let _inner = self.inner.write().await;
        if self.state() != GroupState::Bootstrapping {
            return;
        }

        warn!(channel = %self.proxy.channel(), error = %error, "Bootstrap failed");
        record_counter("group.bootstrap.failed", 1);

        self.lifecycle.send_modify(|lifecycle| {
            lifecycle.state = GroupState::Uninitialized;
            lifecycle.last_error = Some(error.clone());
        });
        self.events.emit(GroupEvent::BootstrapFailed {
            error: error.to_string(),
        });
    }

    /// Bring the model back in line with the channel after missed signals
    async fn resync(&self) -> ProxyResult<()> {
        let current = fetch_members(self.proxy.as_ref()).await?;
        let (_, batches) = resolve_initial(self.resolver.as_ref(), &current).await;

        let _order = self.reconcile.lock().await;
        let mut inner = self.inner.write().await;
        if self.state() != GroupState::Ready {
            return Ok(());
        }

        let present = current.handles();
        let gone: Vec<Contact> = inner
            .membership
            .contacts()
            .into_iter()
            .filter(|contact| !present.contains(&contact.handle()))
            .collect();

        let mut events = inner.membership.apply(ResolvedBatch::default().with_removed(gone));
        for batch in batches {
            events.extend(inner.membership.apply(batch));
        }

        info!(channel = %self.proxy.channel(), events = events.len(), "Resynchronized membership");
        self.events.emit_many(events);
        Ok(())
    }

    async fn destroy(&self, reason: &str) {
        let mut inner = self.inner.write().await;
        if self.state() == GroupState::Destroyed {
            return;
        }

        info!(channel = %self.proxy.channel(), reason, "Group destroyed");
        inner.membership.clear();
        self.set_state(GroupState::Destroyed);
        self.events.emit(GroupEvent::Destroyed);
    }
}

/// Background task: bootstrap, then follow the channel's signals
///
/// Only a weak reference is held between steps, so dropping the group ends
/// the task at its next await point.
async fn run(shared: Weak<Shared>, mut signals: broadcast::Receiver<ChannelSignal>) {
    if !bootstrap(&shared).await {
        return;
    }

    {
        let Some(group) = shared.upgrade() else { return };
        if !group.config.buffer_during_bootstrap {
            loop {
                match signals.try_recv() {
                    Ok(ChannelSignal::MembersChanged(_)) => {
                        debug!(
                            channel = %group.proxy.channel(),
                            "Dropping batch received during bootstrap"
                        );
                        record_counter("group.batches.ignored", 1);
                    }
                    Ok(ChannelSignal::Invalidated { reason }) => {
                        group.destroy(&reason).await;
                        return;
                    }
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
        }
    }

    loop {
        let signal = signals.recv().await;
        let Some(group) = shared.upgrade() else { return };
        if group.state() == GroupState::Destroyed {
            return;
        }

        match signal {
            Ok(ChannelSignal::MembersChanged(batch)) => {
                group.apply_update(batch).await;
            }
            Ok(ChannelSignal::Invalidated { reason }) => {
                group.destroy(&reason).await;
                return;
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(
                    channel = %group.proxy.channel(),
                    missed,
                    "Missed channel signals, resynchronizing"
                );
                if let Err(e) = group.resync().await {
                    warn!(channel = %group.proxy.channel(), error = %e, "Resynchronization failed");
                }
            }
            Err(RecvError::Closed) => {
                group.destroy("channel proxy went away").await;
                return;
            }
        }
    }
}

/// Fetch and apply the initial membership, retrying failed attempts
///
/// Returns true when the group became ready.
async fn bootstrap(shared: &Weak<Shared>) -> bool {
    let (proxy, resolver, config) = match shared.upgrade() {
        Some(group) => (group.proxy.clone(), group.resolver.clone(), group.config.clone()),
        None => return false,
    };
    let channel = proxy.channel().clone();
    let timer = Timer::new("group.bootstrap.duration_ms");

    let mut attempt = 0;
    let fetched = loop {
        attempt += 1;
        match fetch_members(proxy.as_ref()).await {
            Ok(initial) => break Ok(initial),
            Err(e) if attempt < config.bootstrap_attempts => {
                warn!(%channel, attempt, error = %e, "Bootstrap attempt failed, retrying");
                record_counter("group.bootstrap.retries", 1);
                tokio::time::sleep(config.bootstrap_retry_delay).await;
                if shared.strong_count() == 0 {
                    return false;
                }
            }
            Err(e) => break Err(e),
        }
    };

    let initial = match fetched {
        Ok(initial) => initial,
        Err(e) => {
            if let Some(group) = shared.upgrade() {
                group.fail_bootstrap(e).await;
            }
            return false;
        }
    };

    let name = match fetch_name(proxy.as_ref()).await {
        Ok(name) => name,
        Err(e) => {
            warn!(%channel, error = %e, "Cannot fetch group name");
            None
        }
    };

    let (self_contact, batches) = resolve_initial(resolver.as_ref(), &initial).await;

    let Some(group) = shared.upgrade() else { return false };
    let ready = group.finish_bootstrap(&initial, self_contact, name, batches).await;
    if ready {
        timer.stop();
    }
    ready
}

async fn fetch_members(proxy: &dyn ChannelProxy) -> ProxyResult<ChannelMembers> {
    let local_pending = async {
        match proxy.get_local_pending_members_with_info().await {
            Err(ProxyError::NotImplemented(method)) => {
                debug!(%method, "Local pending info unsupported, assuming none");
                Ok(Vec::new())
            }
            other => other,
        }
    };

    let (self_handle, members, local_pending, remote_pending) = tokio::try_join!(
        proxy.get_self_handle(),
        proxy.get_members(),
        local_pending,
        proxy.get_remote_pending_members(),
    )?;

    Ok(ChannelMembers {
        self_handle,
        members,
        local_pending,
        remote_pending,
    })
}

async fn fetch_name(proxy: &dyn ChannelProxy) -> ProxyResult<Option<String>> {
    let channel = proxy.channel();
    if channel.handle_type == HandleType::None || channel.handle.is_none() {
        return Ok(None);
    }

    let names = proxy
        .inspect_handles(channel.handle_type, &[channel.handle])
        .await?;
    Ok(names.into_iter().next())
}

/// Turn the initial membership into batches
///
/// Members come first, then one batch per local pending entry so each keeps
/// its own actor, reason and message, then the remote pending contacts.
async fn resolve_initial(
    resolver: &dyn ContactResolver,
    initial: &ChannelMembers,
) -> (Option<Contact>, Vec<ResolvedBatch>) {
    let self_contact = if initial.self_handle.is_none() {
        None
    } else {
        resolver.resolve(initial.self_handle).await
    };

    let members = resolve_contacts(resolver, &initial.members).await;
    let mut batches = vec![ResolvedBatch::default().with_added(members)];

    for info in &initial.local_pending {
        let Some(member) = resolver.resolve(info.member).await else {
            skip_unresolved(info.member);
            continue;
        };
        let actor = resolve_actor(resolver, info.actor).await;
        batches.push(
            ResolvedBatch::new(actor, info.reason, non_empty(&info.message))
                .with_local_pending(vec![member]),
        );
    }

    batches.push(
        ResolvedBatch::default()
            .with_remote_pending(resolve_contacts(resolver, &initial.remote_pending).await),
    );

    (self_contact, batches)
}

async fn resolve_batch(resolver: &dyn ContactResolver, batch: &MembersChanged) -> ResolvedBatch {
    ResolvedBatch::new(
        resolve_actor(resolver, batch.actor).await,
        batch.reason,
        non_empty(&batch.message),
    )
    .with_added(resolve_contacts(resolver, &batch.added).await)
    .with_removed(resolve_contacts(resolver, &batch.removed).await)
    .with_local_pending(resolve_contacts(resolver, &batch.local_pending).await)
    .with_remote_pending(resolve_contacts(resolver, &batch.remote_pending).await)
}

async fn resolve_contacts(resolver: &dyn ContactResolver, handles: &[Handle]) -> Vec<Contact> {
    if handles.is_empty() {
        return Vec::new();
    }

    let mut resolved = resolver.resolve_many(handles).await;
    resolved.truncate(handles.len());

    // Resolvers answering short are asked again one handle at a time
    for handle in &handles[resolved.len()..] {
        resolved.push(resolver.resolve(*handle).await);
    }

    resolved
        .into_iter()
        .zip(handles)
        .filter_map(|(contact, handle)| {
            if contact.is_none() {
                skip_unresolved(*handle);
            }
            contact
        })
        .collect()
}

async fn resolve_actor(resolver: &dyn ContactResolver, handle: Handle) -> Option<Contact> {
    if handle.is_none() {
        return None;
    }

    let actor = resolver.resolve(handle).await;
    if actor.is_none() {
        debug!(%handle, "Unknown actor, reporting the change without one");
    }
    actor
}

fn skip_unresolved(handle: Handle) {
    let error = GroupError::InvalidBatch { handle };
    warn!(%error, "Skipping batch entry");
    record_counter("group.handles.unresolved", 1);
}

fn handles_of(contacts: &[Contact]) -> Vec<Handle> {
    contacts.iter().map(Contact::handle).collect()
}
