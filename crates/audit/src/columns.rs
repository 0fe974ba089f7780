/// Resolve a column by keyword: case-insensitive substring match on the
/// trimmed header, first match wins.
pub fn find_col(headers: &[String], keyword: &str) -> Option<usize> {
    let key = keyword.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    headers
        .iter()
        .position(|h| h.trim().to_lowercase().contains(&key))
}
