//! Signal publishing boundary.

use crate::signal::Signal;

/// The single publish point for signals.
///
/// Implementations decide delivery; the engine only publishes. The driver's
/// implementation queues signals and offers each one to every live quest.
pub trait SignalDispatcher {
    /// Publishes a signal.
    fn publish(&mut self, signal: Signal);
}
