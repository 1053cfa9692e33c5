//! Domain error types.

use thiserror::Error;

use crate::identity::{PartId, QuestId};

/// Top-level domain error type.
///
/// Programmer and content errors raised by the engine are logged at the point
/// they occur and returned so callers can assert on them; the operation that
/// raised them is skipped.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An operation was attempted in a lifecycle state that forbids it.
    #[error("invalid state for {operation} on {quest_id}: quest is {state}")]
    InvalidState {
        /// The quest the operation targeted.
        quest_id: QuestId,
        /// Operation name.
        operation: &'static str,
        /// Lifecycle state label at the time of the call.
        state: &'static str,
    },

    /// A part that already has an owner was attached again.
    #[error("part already attached to {owner}; refusing to attach to {quest_id}")]
    PartAlreadyAttached {
        /// The quest the attach targeted.
        quest_id: QuestId,
        /// The quest that already owns the part.
        owner: QuestId,
    },

    /// A part id that the quest does not own was referenced.
    #[error("{part_id} is not owned by {quest_id}")]
    PartNotFound {
        /// The quest that was asked.
        quest_id: QuestId,
        /// The unknown part id.
        part_id: PartId,
    },

    /// No live quest carries this id.
    #[error("{0} not found")]
    QuestNotFound(QuestId),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persisted record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message_names_quest_and_state() {
        let err = DomainError::InvalidState {
            quest_id: QuestId(7),
            operation: "end",
            state: "ended_success",
        };

        assert_eq!(
            err.to_string(),
            "invalid state for end on Quest7: quest is ended_success"
        );
    }
}
