//! Keeps only the OCR lines that plausibly belong to a score table.
//!
//! The filter favours recall: headers and other multi-word lines pass
//! through and are discarded later by the parser when they don't match.

use std::sync::LazyLock;

use regex::Regex;

use super::engine::RecognizedText;

/// Two or more whitespace-separated tokens.
static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\S+(\s+\S+)+\s*$").expect("valid table row regex"));

/// Grade summary keywords, whole word, any case. Word boundaries are ASCII
/// only, so an accented letter next to the keyword still counts as a break.
static GRADE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?-u:\b)(?:CGPA|GPA)(?-u:\b)").expect("valid keyword regex")
});

/// Recognized lines that survived filtering, trimmed, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredText {
    pub lines: Vec<String>,
}

impl FilteredText {
    /// Newline-joined snapshot, as stored in history.
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Returns true if the line looks like a table row or mentions (C)GPA.
pub fn is_relevant_line(line: &str) -> bool {
    TABLE_ROW.is_match(line) || GRADE_KEYWORD.is_match(line)
}

/// Selects relevant lines from raw OCR output.
pub fn filter(text: &RecognizedText) -> FilteredText {
    let lines: Vec<String> = text
        .lines
        .iter()
        .filter(|line| is_relevant_line(line))
        .map(|line| line.trim().to_string())
        .collect();

    log::debug!("Filter kept {} of {} lines", lines.len(), text.lines.len());

    FilteredText { lines }
}
