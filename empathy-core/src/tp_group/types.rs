//! Core data types for group membership tracking

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Numeric identifier assigned by the protocol connection to a contact or room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub u32);

impl Handle {
    /// The zero handle, used by the connection manager when there is no actor
    pub const NONE: Handle = Handle(0);

    /// Get the raw handle value
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Check whether this is the zero handle
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Handle {
    fn from(value: u32) -> Self {
        Handle(value)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of entity a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleType {
    None,
    Contact,
    Room,
    List,
    Group,
}

impl HandleType {
    /// Wire value of the handle type
    pub fn as_u32(&self) -> u32 {
        match self {
            HandleType::None => 0,
            HandleType::Contact => 1,
            HandleType::Room => 2,
            HandleType::List => 3,
            HandleType::Group => 4,
        }
    }

    /// Parse a wire value, `None` for values outside the known range
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(HandleType::None),
            1 => Some(HandleType::Contact),
            2 => Some(HandleType::Room),
            3 => Some(HandleType::List),
            4 => Some(HandleType::Group),
            _ => None,
        }
    }
}

/// Reference to the channel a group is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    /// D-Bus object path of the channel
    pub object_path: String,
    /// Type of the channel's target handle
    pub handle_type: HandleType,
    /// The channel's target handle (room, list or contact group)
    pub handle: Handle,
}

impl ChannelRef {
    pub fn new(object_path: impl Into<String>, handle_type: HandleType, handle: Handle) -> Self {
        Self {
            object_path: object_path.into(),
            handle_type,
            handle,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_path)
    }
}

/// A resolved contact
///
/// Two contacts are equal when their handles are equal; the identifier and
/// alias are informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    handle: Handle,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    #[serde(default)]
    is_user: bool,
}

impl Contact {
    /// Create a contact for a handle with its protocol identifier
    pub fn new(handle: Handle, id: impl Into<String>) -> Self {
        Self {
            handle,
            id: id.into(),
            alias: None,
            is_user: false,
        }
    }

    /// Set a display alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Alias if one is known, the identifier otherwise
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.id)
    }

    /// Whether this contact is the local user on the group's connection
    pub fn is_user(&self) -> bool {
        self.is_user
    }

    pub(crate) fn set_is_user(&mut self, is_user: bool) {
        self.is_user = is_user;
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.handle)
    }
}

/// Reason attached to a membership change
///
/// Reasons compare by their numeric code, so `Unknown(4)` equals `Invited`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ChangeReason {
    #[default]
    None,
    Offline,
    Kicked,
    Busy,
    Invited,
    Banned,
    Error,
    InvalidContact,
    NoAnswer,
    Renamed,
    PermissionDenied,
    Separated,
    /// A reason code newer than this library
    ///
    /// `From<u32>` only builds it for codes above 11.
    Unknown(u32),
}

impl PartialEq for ChangeReason {
    fn eq(&self, other: &Self) -> bool {
        u32::from(*self) == u32::from(*other)
    }
}

impl Eq for ChangeReason {}

impl Hash for ChangeReason {
    fn hash<H: Hasher>(&self, state: &mut H) {
        u32::from(*self).hash(state);
    }
}

impl From<u32> for ChangeReason {
    fn from(value: u32) -> Self {
        match value {
            0 => ChangeReason::None,
            1 => ChangeReason::Offline,
            2 => ChangeReason::Kicked,
            3 => ChangeReason::Busy,
            4 => ChangeReason::Invited,
            5 => ChangeReason::Banned,
            6 => ChangeReason::Error,
            7 => ChangeReason::InvalidContact,
            8 => ChangeReason::NoAnswer,
            9 => ChangeReason::Renamed,
            10 => ChangeReason::PermissionDenied,
            11 => ChangeReason::Separated,
            other => ChangeReason::Unknown(other),
        }
    }
}

impl From<ChangeReason> for u32 {
    fn from(reason: ChangeReason) -> Self {
        match reason {
            ChangeReason::None => 0,
            ChangeReason::Offline => 1,
            ChangeReason::Kicked => 2,
            ChangeReason::Busy => 3,
            ChangeReason::Invited => 4,
            ChangeReason::Banned => 5,
            ChangeReason::Error => 6,
            ChangeReason::InvalidContact => 7,
            ChangeReason::NoAnswer => 8,
            ChangeReason::Renamed => 9,
            ChangeReason::PermissionDenied => 10,
            ChangeReason::Separated => 11,
            ChangeReason::Unknown(other) => other,
        }
    }
}

/// Details of an incoming invitation awaiting local approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInfo {
    /// The contact waiting to be accepted into the group
    pub member: Contact,
    /// Who put the member in local pending, if known
    pub actor: Option<Contact>,
    pub reason: ChangeReason,
    pub message: Option<String>,
}

impl PendingInfo {
    pub fn new(
        member: Contact,
        actor: Option<Contact>,
        reason: ChangeReason,
        message: Option<String>,
    ) -> Self {
        Self {
            member,
            actor,
            reason,
            message,
        }
    }
}

/// One raw `MembersChanged` batch as delivered by the channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembersChanged {
    pub message: String,
    pub added: Vec<Handle>,
    pub removed: Vec<Handle>,
    pub local_pending: Vec<Handle>,
    pub remote_pending: Vec<Handle>,
    pub actor: Handle,
    pub reason: ChangeReason,
}

impl MembersChanged {
    /// Check whether the batch carries no handles at all
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.local_pending.is_empty()
            && self.remote_pending.is_empty()
    }

    /// Total number of handles referenced by the batch
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.local_pending.len() + self.remote_pending.len()
    }
}

/// Raw local pending entry as returned by `GetLocalPendingMembersWithInfo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPendingInfo {
    pub member: Handle,
    pub actor: Handle,
    pub reason: ChangeReason,
    #[serde(default)]
    pub message: String,
}

/// An invitation directed at the local user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    /// The contact who invited us; guessed when the channel did not say
    pub inviter: Option<Contact>,
    pub message: Option<String>,
    pub reason: ChangeReason,
}

/// Turn the channel's empty-string convention into an `Option`
pub(crate) fn non_empty(message: &str) -> Option<String> {
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
