//! Per-scan review state machine.
//!
//! `Measured -> AwaitingConfirmation -> Accepted | Remeasure`

use crate::error::{Error, Result};
use crate::store::LeafCountRecord;

use super::prompt::CountAnswer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Measured {
        auto_count: usize,
    },
    AwaitingConfirmation {
        auto_count: usize,
        suggested: usize,
    },
    Accepted {
        auto_count: usize,
        accepted_count: usize,
    },
    Remeasure {
        auto_count: usize,
        accepted_count: usize,
    },
}

impl ReviewState {
    pub fn measured(auto_count: usize) -> Self {
        Self::Measured { auto_count }
    }

    /// Only valid from `Measured`.
    pub fn await_confirmation(self, suggested: usize) -> Result<Self> {
        match self {
            Self::Measured { auto_count } => Ok(Self::AwaitingConfirmation {
                auto_count,
                suggested,
            }),
            other => Err(other.transition_error("prompt for a count")),
        }
    }

    /// Applies the operator's answer. Counts above the automatic count are
    /// clamped to it. Only valid from `AwaitingConfirmation`.
    pub fn confirm(self, filename: &str, answer: CountAnswer) -> Result<Self> {
        let Self::AwaitingConfirmation { auto_count, .. } = self else {
            return Err(self.transition_error("confirm a count"));
        };

        if answer.accepted_count > auto_count {
            tracing::warn!(
                filename,
                entered = answer.accepted_count,
                auto_count,
                "Entered count exceeds detected particles; keeping all of them"
            );
        }
        let accepted_count = answer.accepted_count.min(auto_count);

        Ok(if answer.needs_remeasure {
            Self::Remeasure {
                auto_count,
                accepted_count,
            }
        } else {
            Self::Accepted {
                auto_count,
                accepted_count,
            }
        })
    }

    fn transition_error(&self, action: &'static str) -> Error {
        Error::ReviewTransition {
            state: format!("{self:?}"),
            action,
        }
    }

    /// Row count the result table must be cut to, if any.
    pub fn truncate_to(&self) -> Option<usize> {
        match *self {
            Self::Accepted {
                auto_count,
                accepted_count,
            }
            | Self::Remeasure {
                auto_count,
                accepted_count,
            } if accepted_count < auto_count => Some(accepted_count),
            _ => None,
        }
    }

    /// Ledger row for a resolved state; `None` before confirmation.
    pub fn record(&self, filename: &str) -> Option<LeafCountRecord> {
        let (auto_count, accepted_count, needs_remeasure) = match *self {
            Self::Accepted {
                auto_count,
                accepted_count,
            } => (auto_count, accepted_count, false),
            Self::Remeasure {
                auto_count,
                accepted_count,
            } => (auto_count, accepted_count, true),
            _ => return None,
        };

        Some(LeafCountRecord {
            filename: filename.to_owned(),
            auto_count,
            accepted_count,
            needs_remeasure,
        })
    }
}
