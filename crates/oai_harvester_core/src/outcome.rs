use crate::ResumptionInfo;

/// Result of one harvest step (an initial or continuation request).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// More pages remain; continue with the carried token.
    Continue(ResumptionInfo),
    /// The record list is exhausted and the session was reset.
    Completed,
    /// A continuation page came back without any resumption info. The
    /// session stays active until explicitly reset.
    Stalled,
}

impl StepOutcome {
    pub fn token(&self) -> Option<&str> {
        match self {
            StepOutcome::Continue(info) => Some(info.token.as_str()),
            StepOutcome::Completed | StepOutcome::Stalled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepOutcome::Continue(_))
    }
}
