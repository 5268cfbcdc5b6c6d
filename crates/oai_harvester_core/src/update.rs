use thiserror::Error;

use crate::{Msg, RequestKind, ResumptionInfo, SessionState, StepOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("session {session_number} is already active; reset it first")]
    AlreadyActive { session_number: u32 },
    #[error("no active session")]
    NotActive,
}

impl SessionState {
    /// Returns `(session_number, page_index)` of the active session.
    pub fn require_active(&self) -> Result<(u32, u32), TransitionError> {
        match *self {
            SessionState::Active {
                session_number,
                page_index,
            } => Ok((session_number, page_index)),
            SessionState::Inactive => Err(TransitionError::NotActive),
        }
    }

    pub fn require_inactive(&self) -> Result<(), TransitionError> {
        match *self {
            SessionState::Inactive => Ok(()),
            SessionState::Active { session_number, .. } => {
                Err(TransitionError::AlreadyActive { session_number })
            }
        }
    }
}

/// Pure transition function: applies a message to the session state and
/// returns the next state plus the step outcome, if the message ends a step.
pub fn update(
    state: SessionState,
    msg: Msg,
) -> Result<(SessionState, Option<StepOutcome>), TransitionError> {
    match msg {
        Msg::Reset => Ok((SessionState::Inactive, None)),
        Msg::Begin { session_number } => {
            state.require_inactive()?;
            Ok((
                SessionState::Active {
                    session_number,
                    page_index: 0,
                },
                None,
            ))
        }
        Msg::PageStored {
            request,
            resumption,
        } => page_stored(state, request, resumption).map(|(state, outcome)| (state, Some(outcome))),
    }
}

/// Transition for a fetched and persisted page of the active session.
pub fn page_stored(
    state: SessionState,
    request: RequestKind,
    resumption: Option<ResumptionInfo>,
) -> Result<(SessionState, StepOutcome), TransitionError> {
    let (session_number, page_index) = state.require_active()?;
    Ok(match (request, resumption) {
        // A single-page answer carries no resumption info at all.
        (RequestKind::Initial, None) => (SessionState::Inactive, StepOutcome::Completed),
        // Missing info mid-session is ambiguous; keep the session for the caller.
        (RequestKind::Continuation, None) => (state, StepOutcome::Stalled),
        (_, Some(info)) if info.is_final() => (SessionState::Inactive, StepOutcome::Completed),
        (_, Some(info)) => (
            SessionState::Active {
                session_number,
                page_index: page_index + 1,
            },
            StepOutcome::Continue(info),
        ),
    })
}
