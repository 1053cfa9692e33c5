//! Quest lifecycle state and listen modes.

use serde::{Deserialize, Serialize};

/// How a quest ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOutcome {
    /// Not ended, or ended without a classified outcome.
    #[default]
    Unknown,
    /// Goal achieved.
    Success,
    /// Goal failed.
    Fail,
    /// Became invalid before it was ever accepted.
    InvalidPreAcceptance,
}

impl EndOutcome {
    /// Stable label for logs and notifications.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EndOutcome::Unknown => "unknown",
            EndOutcome::Success => "success",
            EndOutcome::Fail => "fail",
            EndOutcome::InvalidPreAcceptance => "invalid_pre_acceptance",
        }
    }
}

/// Derived lifecycle state of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestState {
    /// Offered, waiting for acceptance.
    NotYetAccepted,
    /// Accepted and running.
    Ongoing,
    /// The acceptance offer ran out.
    EndedOfferExpired,
    /// Ended successfully.
    EndedSuccess,
    /// Ended in failure.
    EndedFailed,
    /// Ended as invalid before acceptance.
    EndedInvalid,
    /// Ended without a classified outcome.
    EndedUnknownOutcome,
}

impl QuestState {
    /// Derives the state from the four fields that define it, in priority
    /// order. No other field may influence the result.
    #[must_use]
    pub fn derive(
        ticks_until_acceptance_expiry: i64,
        ended: bool,
        end_outcome: EndOutcome,
        acceptance_tick: i64,
    ) -> Self {
        if ticks_until_acceptance_expiry == 0 {
            return QuestState::EndedOfferExpired;
        }
        if ended {
            return match end_outcome {
                EndOutcome::Success => QuestState::EndedSuccess,
                EndOutcome::Fail => QuestState::EndedFailed,
                EndOutcome::InvalidPreAcceptance => QuestState::EndedInvalid,
                EndOutcome::Unknown => QuestState::EndedUnknownOutcome,
            };
        }
        if acceptance_tick < 0 {
            return QuestState::NotYetAccepted;
        }
        QuestState::Ongoing
    }

    /// Whether the state is terminal.
    #[must_use]
    pub fn is_historical(self) -> bool {
        !matches!(self, QuestState::NotYetAccepted | QuestState::Ongoing)
    }

    /// Stable label for logs and notifications.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestState::NotYetAccepted => "not_yet_accepted",
            QuestState::Ongoing => "ongoing",
            QuestState::EndedOfferExpired => "ended_offer_expired",
            QuestState::EndedSuccess => "ended_success",
            QuestState::EndedFailed => "ended_failed",
            QuestState::EndedInvalid => "ended_invalid",
            QuestState::EndedUnknownOutcome => "ended_unknown_outcome",
        }
    }
}

/// Gates signal delivery to a part by the owning quest's current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalListenMode {
    /// Only while the quest is ongoing.
    #[default]
    OngoingOnly,
    /// Only while the quest is still an offer.
    NotYetAcceptedOnly,
    /// While offered or ongoing.
    OngoingOrNotYetAccepted,
    /// Only once the quest is historical.
    HistoricalOnly,
    /// In every state.
    Always,
}

impl SignalListenMode {
    /// Whether a part in this mode hears signals while the quest is `state`.
    #[must_use]
    pub fn permits(self, state: QuestState) -> bool {
        match self {
            SignalListenMode::OngoingOnly => state == QuestState::Ongoing,
            SignalListenMode::NotYetAcceptedOnly => state == QuestState::NotYetAccepted,
            SignalListenMode::OngoingOrNotYetAccepted => {
                matches!(state, QuestState::Ongoing | QuestState::NotYetAccepted)
            }
            SignalListenMode::HistoricalOnly => state.is_historical(),
            SignalListenMode::Always => true,
        }
    }
}
