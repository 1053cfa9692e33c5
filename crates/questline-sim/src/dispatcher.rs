//! FIFO signal queue.

use std::collections::VecDeque;

use questline_core::dispatcher::SignalDispatcher;
use questline_core::signal::Signal;

/// Queues published signals for later delivery.
///
/// Publishing never delivers synchronously; the manager pops signals in
/// publication order and offers each one to every live quest.
#[derive(Debug, Default)]
pub struct QueuedDispatcher {
    queue: VecDeque<Signal>,
    published_total: u64,
}

impl QueuedDispatcher {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the oldest queued signal.
    pub fn pop(&mut self) -> Option<Signal> {
        self.queue.pop_front()
    }

    /// Signals waiting for delivery.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Signals published since creation.
    #[must_use]
    pub fn published_total(&self) -> u64 {
        self.published_total
    }
}

impl SignalDispatcher for QueuedDispatcher {
    fn publish(&mut self, signal: Signal) {
        tracing::debug!(tag = signal.tag(), queued = self.queue.len(), "signal queued");
        self.published_total += 1;
        self.queue.push_back(signal);
    }
}

#[cfg(test)]
mod tests {
    use questline_core::signal::SignalArgs;

    use super::*;

    #[test]
    fn test_signals_come_out_in_publication_order() {
        // Arrange
        let mut dispatcher = QueuedDispatcher::new();
        dispatcher.publish(Signal::new("Quest1.A", SignalArgs::new()));
        dispatcher.publish(Signal::global("Storm", SignalArgs::new()));

        // Act
        let first = dispatcher.pop().unwrap();
        let second = dispatcher.pop().unwrap();

        // Assert
        assert_eq!(first.tag(), "Quest1.A");
        assert_eq!(second.tag(), "Storm");
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.published_total(), 2);
    }
}
