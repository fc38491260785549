//! Turns DevTools rule-usage reports into [`CoverageEntry`]s.

use crate::CoverageEntry;
use csscan_coverage::ByteRange;
use std::collections::{HashMap, HashSet};

/// A stylesheet announced by `CSS.styleSheetAdded`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StyleSheet {
    pub id: String,
    pub source_url: String,
    pub is_inline: bool,
}

impl StyleSheet {
    /// Entry URL for the stylesheet. Inline `<style>` blocks and anonymous
    /// sheets (constructed, or injected through the CSSOM) have none, so the
    /// aggregator keys them by page and length.
    fn url(&self) -> &str {
        if self.is_inline { "" } else { &self.source_url }
    }
}

/// One entry of `CSS.stopRuleUsageTracking`, offsets in UTF-16 code units.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TrackedRule {
    pub sheet: String,
    pub start: f64,
    pub end: f64,
    pub used: bool,
}

/// Builds one entry per distinct stylesheet, in announcement order.
///
/// Only used rules contribute ranges. Sheets missing from `texts` (removed
/// before their text could be read) are skipped.
pub(crate) fn coverage_entries(
    sheets: &[StyleSheet],
    rules: &[TrackedRule],
    texts: &HashMap<String, String>,
) -> Vec<CoverageEntry> {
    let mut used: HashMap<&str, Vec<(f64, f64)>> = HashMap::new();
    for rule in rules.iter().filter(|rule| rule.used) {
        used.entry(rule.sheet.as_str()).or_default().push((rule.start, rule.end));
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        if !seen.insert(sheet.id.as_str()) {
            continue;
        }
        let Some(text) = texts.get(&sheet.id) else {
            continue;
        };
        let offsets = Utf16Offsets::new(text);
        let ranges = used
            .remove(sheet.id.as_str())
            .unwrap_or_default()
            .into_iter()
            .map(|(start, end)| offsets.range(start, end))
            .collect::<Vec<_>>();
        entries.push(CoverageEntry::new(sheet.url(), text.clone(), ranges));
    }
    entries
}

/// Lookup table from UTF-16 code unit offsets to UTF-8 byte offsets.
pub(crate) struct Utf16Offsets {
    bytes: Vec<usize>,
    len: usize,
}

impl Utf16Offsets {
    pub fn new(text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        for (byte, c) in text.char_indices() {
            bytes.push(byte);
            // The second half of a surrogate pair maps past the character.
            for _ in 1..c.len_utf16() {
                bytes.push(byte + c.len_utf8());
            }
        }
        bytes.push(text.len());
        Self { bytes, len: text.len() }
    }

    /// Byte offset for a UTF-16 offset, clamped to the text.
    pub fn byte(&self, offset: f64) -> usize {
        // Offsets are whole numbers transported as JSON doubles.
        let unit = offset.max(0.0) as usize;
        self.bytes.get(unit).copied().unwrap_or(self.len)
    }

    pub fn range(&self, start: f64, end: f64) -> ByteRange {
        ByteRange::new(self.byte(start), self.byte(end))
    }
}
