use crate::aggregate::GlobalCoverage;
use crate::range::merge;

/// Byte counts and reconstructed CSS for a finished scan.
///
/// Each used span and each unused gap is appended to its buffer followed by
/// a newline, in stylesheet order and then in offset order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub used_css: String,
    pub unused_css: String,
}
impl Stats {
    pub fn compute(coverage: &GlobalCoverage) -> Self {
        let mut stats = Self::default();
        for (_key, record) in coverage.iter() {
            let text = record.text.as_str();
            let length = text.len();
            stats.total_bytes += length as u64;
            // Re-merged in case the store holds ranges as first observed.
            let mut cursor = 0;
            for range in merge(record.ranges.iter().copied()) {
                // Offsets past the text, or inside a multi-byte character,
                // are pulled back so slicing stays valid.
                let start = text.floor_char_boundary(range.start.min(length)).max(cursor);
                let end = text.floor_char_boundary(range.end.min(length)).max(start);
                if start > cursor {
                    stats.unused_css.push_str(&text[cursor..start]);
                    stats.unused_css.push('\n');
                }
                stats.used_css.push_str(&text[start..end]);
                stats.used_css.push('\n');
                stats.used_bytes += (end - start) as u64;
                cursor = end;
            }
            if cursor < length {
                stats.unused_css.push_str(&text[cursor..]);
                stats.unused_css.push('\n');
            }
        }
        stats
    }

    pub fn unused_bytes(&self) -> u64 {
        self.total_bytes - self.used_bytes
    }

    /// Unused share of all bytes, rounded to two decimals (`"53.85"`), or
    /// `"0"` when no CSS was observed at all.
    pub fn unused_percentage(&self) -> String {
        if self.total_bytes == 0 {
            return "0".to_string();
        }
        let percentage = self.unused_bytes() as f64 / self.total_bytes as f64 * 100.0;
        format!("{percentage:.2}")
    }
}
