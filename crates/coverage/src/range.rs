use std::ops::Range;

/// A half-open `[start, end)` interval of byte offsets into a stylesheet's text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}
impl ByteRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
impl From<Range<usize>> for ByteRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Merges overlapping *and adjacent* ranges into a minimal set sorted by
/// `start`.
///
/// `[0, 10)` and `[5, 15)` become `[0, 15)`; so do `[0, 10)` and `[10, 15)`.
/// The result never contains two ranges where `a.end >= b.start`, which makes
/// the operation idempotent.
pub fn merge(ranges: impl IntoIterator<Item = ByteRange>) -> Vec<ByteRange> {
    let mut sorted: Vec<ByteRange> = ranges.into_iter().collect();
    sorted.sort_unstable_by_key(|r| r.start);
    let mut merged: Vec<ByteRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(current) if range.start <= current.end => current.end = current.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}
