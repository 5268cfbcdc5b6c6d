/// Page filename: `{prefix}{session}_{page}` where `page` is the 1-based page
/// number, zero-padded to `padding` digits when `padding > 0`.
pub fn page_filename(prefix: &str, session_number: u32, page_number: u32, padding: usize) -> String {
    if padding > 0 {
        format!("{prefix}{session_number}_{page_number:0padding$}")
    } else {
        format!("{prefix}{session_number}_{page_number}")
    }
}

/// Splits a filename produced by [`page_filename`] back into
/// `(session_number, page_number)`. Returns `None` for unrelated files.
pub fn parse_page_filename(prefix: &str, filename: &str) -> Option<(u32, u32)> {
    let rest = filename.strip_prefix(prefix)?;
    let (session, page) = rest.split_once('_')?;
    if !is_decimal(session) || !is_decimal(page) {
        return None;
    }
    Some((session.parse().ok()?, page.parse().ok()?))
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
