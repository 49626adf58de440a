/// Converts a seat string from the tracker API to a 0-based seat index.
///
/// Two encodings occur in the wild: `"Player1"`..`"Player4"` (1-based)
/// and a bare number that is already a 0-based index. Anything else is
/// an unknown seat and yields `None`; callers propagate the `None`
/// instead of guessing a seat.
pub fn seat_index(seat: &str) -> Option<usize> {
    if seat.is_empty() {
        return None;
    }

    if let (Some(prefix), Some(number)) = (seat.get(..6), seat.get(6..)) {
        if prefix.eq_ignore_ascii_case("Player") {
            return match number.parse::<usize>() {
                Ok(n @ 1..=4) => Some(n - 1),
                _ => None,
            };
        }
    }

    seat.parse::<usize>().ok()
}
