//! Async test helpers
//!
//! Receiving group events with timeouts and running futures under a
//! deadline.

use crate::tp_group::GroupEvent;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::time::{timeout, Duration};

/// Default timeout duration for tests (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Short timeout for tests that expect nothing to happen (100ms)
pub const SHORT_TEST_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    Timeout,
    Closed,
    /// The receiver fell behind and missed this many messages
    Lagged(u64),
}

impl std::fmt::Display for RecvTimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecvTimeoutError::Timeout => write!(f, "receive operation timed out"),
            RecvTimeoutError::Closed => write!(f, "channel closed"),
            RecvTimeoutError::Lagged(n) => write!(f, "receiver lagged by {} messages", n),
        }
    }
}

impl std::error::Error for RecvTimeoutError {}

/// Receive from a broadcast channel with a timeout
pub async fn recv_timeout<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    duration: Duration,
) -> Result<T, RecvTimeoutError> {
    match timeout(duration, rx.recv()).await {
        Err(_) => Err(RecvTimeoutError::Timeout),
        Ok(Ok(value)) => Ok(value),
        Ok(Err(broadcast::error::RecvError::Closed)) => Err(RecvTimeoutError::Closed),
        Ok(Err(broadcast::error::RecvError::Lagged(n))) => Err(RecvTimeoutError::Lagged(n)),
    }
}

/// Next group event, panicking after [`DEFAULT_TEST_TIMEOUT`]
pub async fn next_event(rx: &mut broadcast::Receiver<GroupEvent>) -> GroupEvent {
    match recv_timeout(rx, DEFAULT_TEST_TIMEOUT).await {
        Ok(event) => event,
        Err(e) => panic!("Expected a group event: {}", e),
    }
}

/// Collect events until `Ready` (included) is seen
pub async fn events_until_ready(rx: &mut broadcast::Receiver<GroupEvent>) -> Vec<GroupEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = event == GroupEvent::Ready;
        events.push(event);
        if done {
            return events;
        }
    }
}

/// Drain every event already queued without waiting
pub fn try_drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut results = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        results.push(msg);
    }
    results
}

/// Wait until no event arrives for [`SHORT_TEST_TIMEOUT`], returning what did
pub async fn drain_quiet(rx: &mut broadcast::Receiver<GroupEvent>) -> Vec<GroupEvent> {
    let mut events = Vec::new();
    while let Ok(event) = recv_timeout(rx, SHORT_TEST_TIMEOUT).await {
        events.push(event);
    }
    events
}

/// Assert a future completes within duration and return its output
pub async fn assert_completes_within<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => panic!("Future did not complete within {:?}", duration),
    }
}

/// Assert a future does NOT complete within duration
pub async fn assert_times_out<F, T>(duration: Duration, future: F)
where
    F: Future<Output = T>,
{
    if timeout(duration, future).await.is_ok() {
        panic!("Expected future to time out, but it completed within {:?}", duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_timeout_success() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(42).unwrap();

        assert_eq!(recv_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await, Ok(42));
    }

    #[tokio::test]
    async fn test_recv_timeout_times_out() {
        let (_tx, mut rx) = broadcast::channel::<i32>(4);

        let result = recv_timeout(&mut rx, SHORT_TEST_TIMEOUT).await;
        assert_eq!(result, Err(RecvTimeoutError::Timeout));
    }

    #[tokio::test]
    async fn test_recv_timeout_closed() {
        let (tx, mut rx) = broadcast::channel::<i32>(4);
        drop(tx);

        let result = recv_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await;
        assert_eq!(result, Err(RecvTimeoutError::Closed));
    }

    #[tokio::test]
    async fn test_events_until_ready() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(GroupEvent::BootstrapFailed {
            error: "timeout".to_string(),
        })
        .unwrap();
        tx.send(GroupEvent::Ready).unwrap();
        tx.send(GroupEvent::Destroyed).unwrap();

        let events = events_until_ready(&mut rx).await;
        assert_eq!(events.len(), 2);
        assert_eq!(try_drain(&mut rx), vec![GroupEvent::Destroyed]);
    }

    #[tokio::test]
    async fn test_assert_times_out() {
        assert_times_out(SHORT_TEST_TIMEOUT, std::future::pending::<()>()).await;
    }
}
