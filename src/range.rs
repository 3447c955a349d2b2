/// Range comparisons used when merging link lists.
use std::cmp::Ordering;

use tower_lsp::lsp_types::{Position, Range};

fn key(pos: Position) -> (u32, u32) {
    (pos.line, pos.character)
}

/// True if `a` and `b` overlap or share a boundary point.
///
/// Adjacent ranges (`a.end == b.start`) count as touching.
pub(crate) fn intersects_or_touches(a: &Range, b: &Range) -> bool {
    if key(a.end) < key(b.start) {
        return false;
    }
    if key(b.end) < key(a.start) {
        return false;
    }
    true
}

/// Order two ranges by start position, then by end position.
pub(crate) fn compare_starts(a: &Range, b: &Range) -> Ordering {
    key(a.start)
        .cmp(&key(b.start))
        .then_with(|| key(a.end).cmp(&key(b.end)))
}

#[cfg(test)]
pub(crate) fn span(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Range {
    Range::new(
        Position::new(start_line, start_col),
        Position::new(end_line, end_col),
    )
}
