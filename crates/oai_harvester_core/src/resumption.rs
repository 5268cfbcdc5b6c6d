/// Pagination metadata carried by a `<resumptionToken>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumptionInfo {
    /// Opaque continuation token. Empty means the list is exhausted.
    pub token: String,
    pub complete_list_size: Option<u64>,
    pub cursor: Option<u64>,
}

impl ResumptionInfo {
    pub fn new(token: impl Into<String>, complete_list_size: Option<u64>, cursor: Option<u64>) -> Self {
        Self {
            token: token.into(),
            complete_list_size,
            cursor,
        }
    }

    /// True when the repository signalled the last page with an empty token.
    pub fn is_final(&self) -> bool {
        self.token.is_empty()
    }
}
