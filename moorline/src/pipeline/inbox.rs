//! Arrival-ordered store for decoded messages.
//!
//! The inbox is the hand-off point between the event loop and external
//! callers: the message processor appends on the loop thread, while
//! [`Client::get_messages`](crate::client::Client::get_messages) drains from
//! any thread. Both sides take a short internal lock; neither holds it across
//! a suspension point.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared, arrival-ordered collection of decoded messages.
///
/// Cloning is cheap and all clones refer to the same underlying store.
#[derive(Clone, Debug, Default)]
pub struct Inbox {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Inbox {
    /// Creates an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decoded message, preserving arrival order.
    pub fn push(&self, message: String) {
        self.lock().push(message);
    }

    /// Atomically swaps the contents for an empty list and returns the
    /// messages received so far, oldest first.
    ///
    /// A second call with no intervening input returns an empty vec. This is
    /// a drain, never a peek: returned messages are no longer held anywhere.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of messages currently waiting.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no messages are waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // Neither push nor drain can panic mid-mutation, so a poisoned lock
        // still guards a valid list.
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let inbox = Inbox::new();
        inbox.push("a".to_string());
        inbox.push("b".to_string());
        inbox.push("c".to_string());

        assert_eq!(inbox.drain(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_drain_empties_the_inbox() {
        let inbox = Inbox::new();
        inbox.push("hello".to_string());

        let first = inbox.drain();
        let second = inbox.drain();

        assert_eq!(first, vec!["hello"]);
        assert!(second.is_empty());
    }

    #[test]
    fn test_drain_on_empty_inbox_returns_empty() {
        let inbox = Inbox::new();
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_clones_share_the_store() {
        let inbox = Inbox::new();
        let writer = inbox.clone();

        writer.push("shared".to_string());

        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox.drain(), vec!["shared"]);
        assert!(writer.is_empty());
    }
}
