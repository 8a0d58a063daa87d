//! Error types for group membership operations

use crate::tp_group::types::Handle;
use thiserror::Error;

/// Result type for group operations
pub type GroupResult<T> = Result<T, GroupError>;

/// Result type for calls into the channel proxy
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Failure of an asynchronous call on the channel or connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// The remote side answered with a D-Bus error
    #[error("D-Bus error {name}: {message}")]
    Dbus { name: String, message: String },

    /// The connection manager does not implement the method
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// The channel or connection went away before the call completed
    #[error("Proxy disconnected")]
    Disconnected,
}

impl ProxyError {
    /// Convenience constructor for a named D-Bus error
    pub fn dbus(name: impl Into<String>, message: impl Into<String>) -> Self {
        ProxyError::Dbus {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur in group operations
#[derive(Debug, Clone, Error)]
pub enum GroupError {
    /// Mutation attempted before the initial membership snapshot was applied
    #[error("Group is not ready")]
    NotReady,

    /// The group was destroyed or its channel invalidated
    #[error("Group has been destroyed")]
    Destroyed,

    /// A call on the channel proxy failed
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// A batch referenced a handle the contact resolver does not know
    #[error("Cannot resolve handle {handle}")]
    InvalidBatch { handle: Handle },

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<crate::config::ConfigError> for GroupError {
    fn from(e: crate::config::ConfigError) -> Self {
        GroupError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(GroupError::NotReady.to_string(), "Group is not ready");

        let err = GroupError::InvalidBatch { handle: Handle(12) };
        assert_eq!(err.to_string(), "Cannot resolve handle 12");

        let err = ProxyError::dbus(
            "org.freedesktop.Telepathy.Error.NetworkError",
            "connection lost",
        );
        assert!(err.to_string().contains("NetworkError"));
    }

    #[test]
    fn test_proxy_error_conversion() {
        let err: GroupError = ProxyError::Disconnected.into();
        assert!(matches!(err, GroupError::Proxy(ProxyError::Disconnected)));
    }
}
