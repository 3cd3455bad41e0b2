use crate::HarvestError;
use std::fmt;

/// Phases of one harvest run
///
/// `Initializing → Dedupe → (Dispatching → Checkpointing)* → Finalizing → Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Loading prior results and the locator list
    Initializing,

    /// Filtering out locators that already have a record
    Dedupe,

    /// Running one batch of fetches
    Dispatching,

    /// Persisting the accumulator after a batch
    Checkpointing,

    /// Writing the final output
    Finalizing,

    /// Run finished
    Done,
}

impl RunPhase {
    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Initializing, Dedupe)
                | (Dedupe, Dispatching)
                | (Dedupe, Finalizing)
                | (Dispatching, Checkpointing)
                | (Checkpointing, Dispatching)
                | (Checkpointing, Finalizing)
                | (Finalizing, Done)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(self, next: RunPhase) -> Result<RunPhase, HarvestError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initializing => "initializing",
            Self::Dedupe => "dedupe",
            Self::Dispatching => "dispatching",
            Self::Checkpointing => "checkpointing",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        };
        write!(f, "{}", label)
    }
}
