//! Fakes bundled into a ready-made [`QuestEnv`] for unit tests.

use questline_test_support::{
    FakeWorld, MockRng, RecordingDispatcher, RecordingNotifier, StaticDirectory,
};

use super::env::QuestEnv;

#[derive(Debug, Default)]
pub(crate) struct Host {
    pub dispatcher: RecordingDispatcher,
    pub world: FakeWorld,
    pub notifier: RecordingNotifier,
    pub directory: StaticDirectory,
    pub rng: MockRng,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(&mut self, tick: i64) -> QuestEnv<'_> {
        QuestEnv {
            tick,
            dispatcher: &mut self.dispatcher,
            world: &mut self.world,
            notifier: &mut self.notifier,
            directory: &self.directory,
            rng: &mut self.rng,
        }
    }
}
