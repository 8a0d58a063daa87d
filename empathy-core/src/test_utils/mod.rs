//! Test utilities and helpers for Empathy
//!
//! Fixtures for channels, contacts and ready groups, plus helpers for
//! waiting on group events.

pub mod fixtures;
pub mod assertions;
pub mod async_helpers;

pub use fixtures::*;
pub use assertions::*;
pub use async_helpers::*;
