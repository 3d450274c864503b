/// Count non-overlapping occurrences of `marker` in `text`.
///
/// Matching is a literal substring match: a marker followed by a skin-tone
/// modifier or variation selector still counts, since the base sequence is
/// present. Missing text and an empty marker both count zero.
pub fn count_marker(text: Option<&str>, marker: &str) -> u64 {
    match text {
        Some(text) if !marker.is_empty() => text.matches(marker).count() as u64,
        _ => 0,
    }
}
