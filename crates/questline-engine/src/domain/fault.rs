//! Fault-isolation boundary around every part invocation.
//!
//! Parts are independently authored. A hook that returns an error or panics
//! is converted into a [`PartFault`], logged with the quest and part that
//! produced it, and never propagated past the quest's entry points.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use questline_core::identity::{PartId, QuestId};
use thiserror::Error;

use super::part::{PartError, PartResult};

/// Which hook was being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `pre_accept`
    PreAccept,
    /// `on_signal`
    Signal,
    /// `tick`
    Tick,
    /// `pre_cleanup`
    PreCleanup,
    /// `cleanup`
    Cleanup,
}

impl Hook {
    /// Hook name for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::PreAccept => "pre_accept",
            Hook::Signal => "on_signal",
            Hook::Tick => "tick",
            Hook::PreCleanup => "pre_cleanup",
            Hook::Cleanup => "cleanup",
        }
    }
}

/// A contained failure of one part hook.
#[derive(Debug, Error)]
pub enum PartFault {
    /// The hook returned an error.
    #[error("{kind} {part_id} of {quest_id} failed in {}: {source}", .hook.as_str())]
    Returned {
        /// Owning quest.
        quest_id: QuestId,
        /// Faulting part.
        part_id: PartId,
        /// Part kind.
        kind: &'static str,
        /// Hook that failed.
        hook: Hook,
        /// The returned error.
        #[source]
        source: PartError,
    },

    /// The hook panicked.
    #[error("{kind} {part_id} of {quest_id} panicked in {}: {message}", .hook.as_str())]
    Panicked {
        /// Owning quest.
        quest_id: QuestId,
        /// Faulting part.
        part_id: PartId,
        /// Part kind.
        kind: &'static str,
        /// Hook that panicked.
        hook: Hook,
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl PartFault {
    /// The faulting part.
    #[must_use]
    pub fn part_id(&self) -> PartId {
        match self {
            PartFault::Returned { part_id, .. } | PartFault::Panicked { part_id, .. } => *part_id,
        }
    }

    /// The hook that faulted.
    #[must_use]
    pub fn hook(&self) -> Hook {
        match self {
            PartFault::Returned { hook, .. } | PartFault::Panicked { hook, .. } => *hook,
        }
    }
}

/// Identifies the part a guarded call belongs to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PartSite {
    pub quest_id: QuestId,
    pub part_id: PartId,
    pub kind: &'static str,
}

/// Runs one hook behind the fault boundary.
pub(crate) fn guarded<F>(site: PartSite, hook: Hook, call: F) -> Result<(), PartFault>
where
    F: FnOnce() -> PartResult,
{
    let fault = match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(source)) => PartFault::Returned {
            quest_id: site.quest_id,
            part_id: site.part_id,
            kind: site.kind,
            hook,
            source,
        },
        Err(payload) => PartFault::Panicked {
            quest_id: site.quest_id,
            part_id: site.part_id,
            kind: site.kind,
            hook,
            message: panic_message(payload.as_ref()),
        },
    };
    tracing::error!(
        quest_id = %site.quest_id,
        part_id = %site.part_id,
        part_kind = site.kind,
        hook = hook.as_str(),
        error = %fault,
        "quest part faulted; continuing with remaining parts"
    );
    Err(fault)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> PartSite {
        PartSite {
            quest_id: QuestId(3),
            part_id: PartId(1),
            kind: "test",
        }
    }

    #[test]
    fn test_guarded_passes_through_success() {
        assert!(guarded(site(), Hook::Tick, || Ok(())).is_ok());
    }

    #[test]
    fn test_guarded_wraps_returned_error() {
        let fault = guarded(site(), Hook::Signal, || {
            Err(PartError::Fault("boom".to_owned()))
        })
        .unwrap_err();

        assert!(matches!(fault, PartFault::Returned { .. }));
        assert_eq!(fault.hook(), Hook::Signal);
        assert_eq!(fault.part_id(), PartId(1));
    }

    #[test]
    fn test_guarded_catches_panics() {
        let fault = guarded(site(), Hook::Tick, || panic!("part exploded")).unwrap_err();

        match fault {
            PartFault::Panicked { message, .. } => assert_eq!(message, "part exploded"),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }
}
