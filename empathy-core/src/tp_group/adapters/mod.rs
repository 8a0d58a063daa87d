//! Collaborator implementations

pub mod mock_proxy;

pub use mock_proxy::{MemberRequest, MockCall, MockChannelProxy, MockContactResolver, RequestKind};
