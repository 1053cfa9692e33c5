//! Deterministic fakes for the questline engine's collaborators.

mod clock;
mod directory;
mod dispatcher;
mod notifier;
mod repository;
mod rng;
mod world;

pub use clock::FixedClock;
pub use directory::StaticDirectory;
pub use dispatcher::RecordingDispatcher;
pub use notifier::RecordingNotifier;
pub use repository::{EmptySaveRepository, FailingSaveRepository, InMemorySaveRepository};
pub use rng::{MockRng, SequenceRng};
pub use world::FakeWorld;
