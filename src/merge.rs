/// Merge of two ordered, non-overlapping link lists.
use std::cmp::Ordering;

use tower_lsp::lsp_types::Range;

use crate::link::Link;
use crate::range::{compare_starts, intersects_or_touches};

/// Anything that occupies a range in a document.
pub(crate) trait Spanned {
    fn span(&self) -> Range;
}

impl Spanned for Link {
    fn span(&self) -> Range {
        self.range()
    }
}

impl Spanned for Range {
    fn span(&self) -> Range {
        *self
    }
}

/// Merge `new` into `old`, dropping every old element that intersects or
/// touches a new one.
///
/// Both inputs must be sorted by start and internally non-overlapping; the
/// output is too. When starts compare equal the new element is emitted
/// first, though with touching counted as overlap such a pair never
/// survives the intersection check.
pub(crate) fn merge<T: Spanned>(old: Vec<T>, new: Vec<T>) -> Vec<T> {
    let mut result = Vec::with_capacity(old.len() + new.len());
    let mut old = old.into_iter().peekable();
    let mut new = new.into_iter().peekable();

    loop {
        let (Some(o), Some(n)) = (old.peek(), new.peek()) else {
            break;
        };
        let (o, n) = (o.span(), n.span());
        if intersects_or_touches(&o, &n) {
            old.next();
            continue;
        }
        let next = match compare_starts(&o, &n) {
            Ordering::Less => old.next(),
            Ordering::Equal | Ordering::Greater => new.next(),
        };
        result.extend(next);
    }

    result.extend(old);
    result.extend(new);
    result
}
