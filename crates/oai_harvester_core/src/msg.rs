use crate::ResumptionInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `verb=ListRecords` with set, metadataPrefix and optional `from`.
    Initial,
    /// `verb=ListRecords` with a resumption token.
    Continuation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Drop any active session, from any state.
    Reset,
    /// Claim a session number and start paging from page 0.
    Begin { session_number: u32 },
    /// A page for the current session was fetched and persisted.
    PageStored {
        request: RequestKind,
        resumption: Option<ResumptionInfo>,
    },
}
