//! The collaborators a quest needs while it runs.

use questline_core::directory::QuestDirectory;
use questline_core::dispatcher::SignalDispatcher;
use questline_core::notify::QuestNotifier;
use questline_core::rng::DeterministicRng;
use questline_core::world::WorldAccess;

/// Borrowed collaborators for one engine call.
///
/// The driver builds one per tick (or per delivered signal) and passes it to
/// every quest operation that can have side effects.
pub struct QuestEnv<'a> {
    /// Current simulation tick.
    pub tick: i64,
    /// Signal publish point.
    pub dispatcher: &'a mut dyn SignalDispatcher,
    /// World queries and placement.
    pub world: &'a mut dyn WorldAccess,
    /// Letters and lifecycle notifications.
    pub notifier: &'a mut dyn QuestNotifier,
    /// Lookups over the other live quests.
    pub directory: &'a dyn QuestDirectory,
    /// Randomness.
    pub rng: &'a mut dyn DeterministicRng,
}

impl std::fmt::Debug for QuestEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestEnv")
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
