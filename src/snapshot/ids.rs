//! Display identifiers for cells

/// Number of trailing characters that discriminate cells within a session.
pub const SHORT_ID_LEN: usize = 4;

/// Derive the short, display-only identifier from a full cell ID.
///
/// Full IDs share a per-session prefix, so only the trailing
/// [`SHORT_ID_LEN`] characters tell cells apart. Shorter IDs are returned
/// whole. The result is not authoritative: two sessions can produce the
/// same short ID.
pub fn short_id(full_id: &str) -> &str {
    let char_count = full_id.chars().count();
    if char_count <= SHORT_ID_LEN {
        return full_id;
    }
    let start = full_id
        .char_indices()
        .nth(char_count - SHORT_ID_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &full_id[start..]
}
