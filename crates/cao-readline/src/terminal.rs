//! Terminal size query.

/// Fallback used when stdout is not a terminal.
const FALLBACK_SIZE: (usize, usize) = (80, 24);

/// Returns `(columns, rows)` of the controlling terminal.
pub fn size() -> (usize, usize) {
    match crossterm::terminal::size() {
        Ok((columns, rows)) if columns > 0 && rows > 0 => (usize::from(columns), usize::from(rows)),
        _ => FALLBACK_SIZE,
    }
}
