//! Custom assertions for group tests

use crate::tp_group::{GroupEvent, MembershipSnapshot};
use std::collections::HashSet;
use std::fmt::Debug;

/// Assert that a Result is Ok and return the value
pub fn assert_ok<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a Result is Err and return the error
pub fn assert_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
        Err(e) => e,
    }
}

/// Assert that an Option is Some and return the value
pub fn assert_some<T>(option: Option<T>) -> T {
    match option {
        Some(value) => value,
        None => panic!("Expected Some, got None"),
    }
}

/// Assert no handle appears in more than one membership set
pub fn assert_exclusive(snapshot: &MembershipSnapshot) {
    let mut seen = HashSet::new();
    let handles = snapshot
        .members
        .iter()
        .map(|c| c.handle())
        .chain(snapshot.local_pending.iter().map(|info| info.member.handle()))
        .chain(snapshot.remote_pending.iter().map(|c| c.handle()));

    for handle in handles {
        if !seen.insert(handle) {
            panic!("Handle {} is in more than one set: {:?}", handle, snapshot);
        }
    }
}

/// Assert the events' kinds, in order, e.g. `["member-added", "ready"]`
pub fn assert_event_names(events: &[GroupEvent], expected: &[&str]) {
    let names: Vec<&str> = events.iter().map(GroupEvent::name).collect();
    assert_eq!(names, expected, "unexpected events: {:?}", events);
}

/// Handles of the contacts named by membership events, in order
pub fn event_handles(events: &[GroupEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(GroupEvent::contact)
        .map(|c| c.handle().as_u32())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tp_group::{Contact, Handle, PendingInfo};

    #[test]
    fn test_assert_ok() {
        let result: Result<i32, &str> = Ok(42);
        assert_eq!(assert_ok(result), 42);
    }

    #[test]
    #[should_panic(expected = "Expected Ok")]
    fn test_assert_ok_panics() {
        let result: Result<i32, &str> = Err("error");
        assert_ok(result);
    }

    #[test]
    #[should_panic(expected = "more than one set")]
    fn test_assert_exclusive_detects_duplicates() {
        let alice = Contact::new(Handle(2), "alice@example.com");
        assert_exclusive(&MembershipSnapshot {
            members: vec![alice.clone()],
            local_pending: vec![PendingInfo::new(alice, None, Default::default(), None)],
            remote_pending: vec![],
        });
    }
}
