//! Empathy group membership library
//!
//! Keeps a local mirror of a Telepathy channel's group membership (members,
//! local pending and remote pending contacts) and emits an event for every
//! change. See [`tp_group::TpGroup`].

pub mod config;
pub mod logging;
pub mod metrics;
pub mod tp_group;
pub mod test_utils;

pub use config::{Config, ConfigError, GroupConfig};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
pub use tp_group::{GroupError, GroupEvent, GroupResult, TpGroup};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        let _ = GroupConfig::default();
        assert_eq!(GroupEvent::Ready.name(), "ready");
    }
}
