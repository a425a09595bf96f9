//! Extraction of the two HTML constructs the exporter writes: column tables
//! and `<details>` toggles.

use regex::Regex;

pub(super) struct HtmlExtractor {
    cell: Regex,
    summary: Regex,
    body: Regex,
}

impl HtmlExtractor {
    pub(super) fn new() -> Self {
        Self {
            cell: Regex::new(r"(?s)<td[^>]*>(.*?)</td>").unwrap(),
            summary: Regex::new(r"(?s)<summary>(.*?)</summary>").unwrap(),
            body: Regex::new(r"(?s)</summary>(.*)</details>").unwrap(),
        }
    }

    /// Inner HTML of every `<td>` cell, trimmed, in source order.
    pub(super) fn table_cells(&self, html: &str) -> Vec<String> {
        self.cell
            .captures_iter(html)
            .map(|caps| caps[1].trim().to_string())
            .collect()
    }

    /// Split a `<details>` block into its summary and body.
    ///
    /// Returns `None` when there is no `<summary>` element.
    pub(super) fn split_details(&self, html: &str) -> Option<(String, String)> {
        let summary = self.summary.captures(html)?[1].trim().to_string();
        let body = self
            .body
            .captures(html)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default();
        Some((summary, body))
    }
}

/// Count non-overlapping occurrences of `tag` in `line`.
pub(super) fn count_tag(line: &str, tag: &str) -> usize {
    line.matches(tag).count()
}
