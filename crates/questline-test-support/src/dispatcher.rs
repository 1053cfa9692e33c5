//! Test dispatcher: records every published signal in order.

use questline_core::dispatcher::SignalDispatcher;
use questline_core::signal::Signal;

/// A dispatcher that only records. Nothing is delivered back to quests.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    published: Vec<Signal>,
}

impl RecordingDispatcher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every signal published so far, in order.
    #[must_use]
    pub fn published(&self) -> &[Signal] {
        &self.published
    }

    /// Tags of every published signal, in order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.published
            .iter()
            .map(|signal| signal.tag().to_owned())
            .collect()
    }

    /// Drains the recording.
    pub fn take(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.published)
    }
}

impl SignalDispatcher for RecordingDispatcher {
    fn publish(&mut self, signal: Signal) {
        self.published.push(signal);
    }
}
