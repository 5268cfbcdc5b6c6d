/// Session lifecycle. A session is either inactive or active with a session
/// number and a 0-based count of pages written so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Inactive,
    Active { session_number: u32, page_index: u32 },
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    pub fn session_number(&self) -> Option<u32> {
        match self {
            SessionState::Active { session_number, .. } => Some(*session_number),
            SessionState::Inactive => None,
        }
    }

    pub fn page_index(&self) -> Option<u32> {
        match self {
            SessionState::Active { page_index, .. } => Some(*page_index),
            SessionState::Inactive => None,
        }
    }
}
