// src/extract.rs

//! Mod-count extraction from raw page content.
//!
//! The Workshop page has shipped several layouts over time; each gets one
//! pattern, tried in order. The mirror route returns the page as plain text,
//! so the text patterns come first and the DOM probe last.

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};

/// Extracts the total mod count from heterogeneous page layouts.
pub struct CountExtractor {
    patterns: Vec<Regex>,
    total_marker: Selector,
}

impl CountExtractor {
    /// Compile the known layout patterns.
    ///
    /// Order matters: earlier patterns take priority over later,
    /// functionally-overlapping ones.
    pub fn new() -> Self {
        let patterns = vec![
            // "See all 1,234 Mods" link under the search box
            Regex::new(r"(?i)See\s+all\s+([\d,\.]+)\s+Mods").expect("invalid layout pattern"),
            // "Showing 1-30 of 1,234 entries" paging footer
            Regex::new(r"(?i)Showing\s+\d+(?:-\d+)?\s+of\s+([\d,\.]+)\s+entries")
                .expect("invalid layout pattern"),
        ];

        let total_marker =
            Selector::parse("#searchResults_total").expect("invalid total-count selector");

        Self {
            patterns,
            total_marker,
        }
    }

    /// Extract the count, trying each known layout in order.
    ///
    /// Fails when no layout matches; that signals page-format drift and must
    /// never degrade into a default value.
    pub fn parse(&self, raw: &str) -> Result<u64> {
        for pattern in &self.patterns {
            if let Some(captures) = pattern.captures(raw) {
                if let Some(count) = parse_count_text(&captures[1]) {
                    return Ok(count);
                }
            }
        }

        // Total-count element marker, e.g. <div id="searchResults_total">1,234</div>
        let document = Html::parse_document(raw);
        if let Some(element) = document.select(&self.total_marker).next() {
            let text: String = element.text().collect();
            if let Some(count) = parse_count_text(&text) {
                return Ok(count);
            }
        }

        Err(AppError::parse(
            "no known layout matched; the page format may have changed",
        ))
    }
}

impl Default for CountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip separators and punctuation from a matched numeric substring.
fn parse_count_text(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_see_all_layout() {
        let extractor = CountExtractor::new();
        let page = "<a href=\"/browse\">see all 1,234 Mods</a>";
        assert_eq!(extractor.parse(page).unwrap(), 1234);
    }

    #[test]
    fn test_showing_entries_layout() {
        let extractor = CountExtractor::new();
        let page = "<p>Showing 1-30 of 2.048 entries</p>";
        assert_eq!(extractor.parse(page).unwrap(), 2048);
    }

    #[test]
    fn test_total_marker_layout() {
        let extractor = CountExtractor::new();
        let page = "<html><body><div id=\"searchResults_total\"> 567 </div></body></html>";
        assert_eq!(extractor.parse(page).unwrap(), 567);
    }

    #[test]
    fn test_earlier_pattern_wins() {
        let extractor = CountExtractor::new();
        let page = "See all 100 Mods <p>Showing 1-30 of 999 entries</p>";
        assert_eq!(extractor.parse(page).unwrap(), 100);
    }

    #[test]
    fn test_unknown_layout_is_an_error() {
        let extractor = CountExtractor::new();
        let err = extractor.parse("<html><body>maintenance page</body></html>");
        assert!(err.is_err());
    }

    #[test]
    fn test_no_zero_fallback_for_digitless_match() {
        let extractor = CountExtractor::new();
        // The phrasing matches but the captured group strips to nothing.
        assert!(extractor.parse("Showing 1 of ,. entries").is_err());
    }

    #[test]
    fn test_parse_count_text_strips_separators() {
        assert_eq!(parse_count_text("1,234"), Some(1234));
        assert_eq!(parse_count_text("1.234"), Some(1234));
        assert_eq!(parse_count_text(" 42 "), Some(42));
        assert_eq!(parse_count_text(",."), None);
    }
}
