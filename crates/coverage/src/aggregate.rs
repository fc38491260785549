use crate::CoverageEntry;
use crate::range::{ByteRange, merge};
use std::collections::HashMap;

/// Accumulated coverage for one stylesheet across every visited page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageRecord {
    /// Stylesheet source, fixed at the first observation of its key.
    pub text: String,
    pub ranges: Vec<ByteRange>,
}

/// Keyed store of [`CoverageRecord`]s, iterated in first-insertion order.
///
/// Without cross-page merging, a rule used on page A but not on page B would
/// read as partially unused overall. [`absorb`](Self::absorb) is where the
/// two observations are reconciled.
#[derive(Debug, Default)]
pub struct GlobalCoverage {
    records: Vec<(String, CoverageRecord)>,
    index: HashMap<String, usize>,
}
impl GlobalCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregation key for an entry observed on the `page_ordinal`th page.
    ///
    /// Stylesheets with a resource URL are keyed by it. Inline stylesheets get
    /// a synthesized `inline-{page}-{length}` key, so two inline blocks of
    /// equal length on the same page collide and have their ranges merged.
    pub fn key_for(entry: &CoverageEntry, page_ordinal: usize) -> String {
        if entry.url.is_empty() {
            format!("inline-{page_ordinal}-{}", entry.text.chars().count())
        } else {
            entry.url.clone()
        }
    }

    /// Merges one page visit's raw entries into the store.
    ///
    /// A new key is inserted as observed. An existing key keeps its original
    /// text and has its ranges replaced by `merge(existing ++ new)`; the new
    /// entry's text is not compared against the stored one.
    pub fn absorb(&mut self, entries: impl IntoIterator<Item = CoverageEntry>, page_ordinal: usize) {
        for entry in entries {
            let key = Self::key_for(&entry, page_ordinal);
            match self.index.get(&key) {
                Some(&position) => {
                    let record = &mut self.records[position].1;
                    let existing = std::mem::take(&mut record.ranges);
                    record.ranges = merge(existing.into_iter().chain(entry.ranges));
                },
                None => {
                    tracing::trace!(key = %key, bytes = entry.text.len(), "New stylesheet observed");
                    self.index.insert(key.clone(), self.records.len());
                    self.records.push((
                        key,
                        CoverageRecord {
                            text: entry.text,
                            ranges: entry.ranges,
                        },
                    ));
                },
            }
        }
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&CoverageRecord> {
        self.index.get(key.as_ref()).map(|&position| &self.records[position].1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CoverageRecord)> {
        self.records.iter().map(|(key, record)| (key.as_str(), record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, text: &str, ranges: &[(usize, usize)]) -> CoverageEntry {
        CoverageEntry::new(url, text, ranges.iter().map(|&(s, e)| ByteRange::new(s, e)))
    }

    #[test]
    fn test_same_key_across_pages_is_merged() {
        let text = "a{color:red}b{color:blue}";
        let mut coverage = GlobalCoverage::new();
        coverage.absorb([entry("https://a.com/site.css", text, &[(0, 10)])], 1);
        coverage.absorb([entry("https://a.com/site.css", text, &[(5, 15)])], 2);
        assert_eq!(coverage.len(), 1);
        let record = coverage.get("https://a.com/site.css").unwrap();
        assert_eq!(record.ranges, vec![ByteRange::new(0, 15)]);
    }

    #[test]
    fn test_first_text_wins() {
        let mut coverage = GlobalCoverage::new();
        coverage.absorb([entry("https://a.com/site.css", "first", &[(0, 1)])], 1);
        coverage.absorb([entry("https://a.com/site.css", "second version", &[(2, 3)])], 2);
        let record = coverage.get("https://a.com/site.css").unwrap();
        assert_eq!(record.text, "first");
        assert_eq!(record.ranges, vec![ByteRange::new(0, 1), ByteRange::new(2, 3)]);
    }

    #[test]
    fn test_new_key_is_stored_as_observed() {
        let mut coverage = GlobalCoverage::new();
        coverage.absorb([entry("https://a.com/x.css", "0123456789", &[(6, 8), (0, 2), (1, 3)])], 1);
        let record = coverage.get("https://a.com/x.css").unwrap();
        assert_eq!(record.ranges.len(), 3);
    }

    #[test]
    fn test_inline_key_is_synthesized() {
        let inline = entry("", "p{margin:0}", &[(0, 11)]);
        assert_eq!(GlobalCoverage::key_for(&inline, 3), "inline-3-11");
        let linked = entry("https://a.com/x.css", "p{margin:0}", &[]);
        assert_eq!(GlobalCoverage::key_for(&linked, 3), "https://a.com/x.css");
    }

    #[test]
    fn test_equal_length_inline_blocks_on_one_page_collide() {
        // Different stylesheets, same length, same page: they share a key, so
        // the second block's ranges are merged into the first block's record.
        let mut coverage = GlobalCoverage::new();
        coverage.absorb([entry("", "a{top:0}", &[(0, 2)]), entry("", "b{left:0}", &[])], 1);
        coverage.absorb([entry("", "i{top:1}", &[(4, 8)])], 1);
        assert_eq!(coverage.len(), 2);
        let record = coverage.get("inline-1-8").unwrap();
        assert_eq!(record.text, "a{top:0}");
        assert_eq!(record.ranges, vec![ByteRange::new(0, 2), ByteRange::new(4, 8)]);
    }

    #[test]
    fn test_inline_blocks_on_different_pages_stay_apart() {
        let mut coverage = GlobalCoverage::new();
        coverage.absorb([entry("", "a{top:0}", &[(0, 2)])], 1);
        coverage.absorb([entry("", "a{top:0}", &[(0, 8)])], 2);
        assert_eq!(coverage.len(), 2);
        assert!(coverage.get("inline-1-8").is_some());
        assert!(coverage.get("inline-2-8").is_some());
    }

    #[test]
    fn test_iterates_in_insertion_order() {
        let mut coverage = GlobalCoverage::new();
        coverage.absorb([entry("https://a.com/z.css", "z", &[]), entry("https://a.com/a.css", "a", &[])], 1);
        coverage.absorb([entry("https://a.com/m.css", "m", &[]), entry("https://a.com/z.css", "z", &[])], 2);
        let keys: Vec<_> = coverage.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["https://a.com/z.css", "https://a.com/a.css", "https://a.com/m.css"]);
    }
}
